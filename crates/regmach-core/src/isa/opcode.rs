//! Opcode Definitions
//!
//! Defines the instruction mnemonics, their operand layout and the test kinds
//! used by conditional jumps. This file contains no execution semantics.

use std::fmt;

/// Kind of operand expected at a given argument position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Register,
    Memory,
    Label,
}

/// Instruction opcodes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpCode {
    // I/O
    In = 0,
    Out = 1,

    // Data movement
    Mov = 2,
    Load = 3,
    Store = 4,

    // Arithmetic
    Inc = 5,
    Dec = 6,
    Add = 7,
    Sub = 8,

    // Control flow
    Jump = 9,
    Jz = 10,
    Jnz = 11,

    // System
    Halt = 12,
}

impl OpCode {
    /// Every opcode, in discriminant order.
    pub const ALL: [OpCode; 13] = [
        OpCode::In,
        OpCode::Out,
        OpCode::Mov,
        OpCode::Load,
        OpCode::Store,
        OpCode::Inc,
        OpCode::Dec,
        OpCode::Add,
        OpCode::Sub,
        OpCode::Jump,
        OpCode::Jz,
        OpCode::Jnz,
        OpCode::Halt,
    ];

    /// Opcodes whose use is gated by a per-register permission.
    pub const REGISTER_OPS: [OpCode; 9] = [
        OpCode::In,
        OpCode::Out,
        OpCode::Mov,
        OpCode::Load,
        OpCode::Store,
        OpCode::Inc,
        OpCode::Dec,
        OpCode::Add,
        OpCode::Sub,
    ];

    /// Parse a mnemonic, ignoring case
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        let upper = text.trim().to_ascii_uppercase();
        OpCode::ALL.into_iter().find(|op| op.mnemonic() == upper)
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            OpCode::In => "IN",
            OpCode::Out => "OUT",
            OpCode::Mov => "MOV",
            OpCode::Load => "LOAD",
            OpCode::Store => "STORE",
            OpCode::Inc => "INC",
            OpCode::Dec => "DEC",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Jump => "JUMP",
            OpCode::Jz => "JZ",
            OpCode::Jnz => "JNZ",
            OpCode::Halt => "HALT",
        }
    }

    /// Operand kinds, in source order
    pub const fn operands(self) -> &'static [ArgKind] {
        use ArgKind::*;
        match self {
            OpCode::In | OpCode::Out | OpCode::Inc | OpCode::Dec => &[Register],
            OpCode::Mov | OpCode::Add | OpCode::Sub => &[Register, Register],
            OpCode::Load => &[Memory, Register],
            OpCode::Store => &[Register, Memory],
            OpCode::Jump => &[Label],
            OpCode::Jz | OpCode::Jnz => &[Register, Label],
            OpCode::Halt => &[],
        }
    }

    pub const fn arity(self) -> usize {
        self.operands().len()
    }

    /// Position of the register operand whose permissions must allow this opcode.
    ///
    /// For two-register forms this is the destination.
    pub const fn gated_operand(self) -> Option<usize> {
        match self {
            OpCode::In | OpCode::Out | OpCode::Inc | OpCode::Dec | OpCode::Store => Some(0),
            OpCode::Mov | OpCode::Add | OpCode::Sub | OpCode::Load => Some(1),
            OpCode::Jump | OpCode::Jz | OpCode::Jnz | OpCode::Halt => None,
        }
    }

    /// Test evaluated by a conditional jump, if any
    pub const fn test(self) -> Option<TestKind> {
        match self {
            OpCode::Jz | OpCode::Jnz => Some(TestKind::Zero),
            _ => None,
        }
    }

    pub fn is_register_op(self) -> bool {
        self.gated_operand().is_some()
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Register tests available to conditional jumps
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TestKind {
    /// `=0`: the register holds zero
    Zero = 0,
}

impl TestKind {
    pub const ALL: [TestKind; 1] = [TestKind::Zero];

    pub const fn tag(self) -> &'static str {
        match self {
            TestKind::Zero => "=0",
        }
    }

    /// Parse a test tag. Accepts `=0`, `= 0` and `zero` in any case.
    pub fn from_tag(text: &str) -> Option<Self> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.to_ascii_lowercase().as_str() {
            "=0" | "zero" => Some(TestKind::Zero),
            _ => None,
        }
    }

    pub fn holds(self, value: i64) -> bool {
        match self {
            TestKind::Zero => value == 0,
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonics_parse_case_insensitively() {
        assert_eq!(OpCode::from_mnemonic("jnz"), Some(OpCode::Jnz));
        assert_eq!(OpCode::from_mnemonic("Halt"), Some(OpCode::Halt));
        assert_eq!(OpCode::from_mnemonic("MUL"), None);
    }

    #[test]
    fn arities_follow_operand_layout() {
        assert_eq!(OpCode::Halt.arity(), 0);
        assert_eq!(OpCode::Jump.arity(), 1);
        assert_eq!(OpCode::Load.operands(), &[ArgKind::Memory, ArgKind::Register]);
        assert_eq!(OpCode::Store.operands(), &[ArgKind::Register, ArgKind::Memory]);
    }

    #[test]
    fn gated_operand_is_destination_for_binary_forms() {
        assert_eq!(OpCode::Add.gated_operand(), Some(1));
        assert_eq!(OpCode::Store.gated_operand(), Some(0));
        assert_eq!(OpCode::Jz.gated_operand(), None);
        assert!(OpCode::REGISTER_OPS.iter().all(|op| op.is_register_op()));
    }

    #[test]
    fn test_tags_are_lenient() {
        assert_eq!(TestKind::from_tag("= 0"), Some(TestKind::Zero));
        assert_eq!(TestKind::from_tag("ZERO"), Some(TestKind::Zero));
        assert_eq!(TestKind::from_tag("> 0"), None);
    }
}
