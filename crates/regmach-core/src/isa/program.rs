//! Program container
//!
//! An ordered instruction list plus its label table.

use std::collections::BTreeMap;

use super::instruction::Instruction;

/// Parsed program: instructions in source order and label → index bindings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: BTreeMap<String, usize>,
    duplicates: Vec<(String, usize)>,
}

impl Program {
    /// Build a program, binding each label to the first instruction that defines it.
    ///
    /// Later definitions of the same label are kept in [`Program::duplicate_labels`].
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        let mut labels = BTreeMap::new();
        let mut duplicates = Vec::new();

        for (index, instr) in instructions.iter().enumerate() {
            if let Some(label) = &instr.label {
                if labels.contains_key(label) {
                    duplicates.push((label.clone(), instr.line));
                } else {
                    labels.insert(label.clone(), index);
                }
            }
        }

        Program {
            instructions,
            labels,
            duplicates,
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn labels(&self) -> &BTreeMap<String, usize> {
        &self.labels
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    /// Shadowed label definitions as `(label, source line)`
    pub fn duplicate_labels(&self) -> &[(String, usize)] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
