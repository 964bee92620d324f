//! Instruction Representation
//!
//! [`Instruction`] is a source line as written by the user; [`Op`] is the
//! typed form produced by the validator once every operand has been resolved.

use super::opcode::OpCode;
use super::operand::{Cell, Reg};

/// One parsed source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub label: Option<String>,
    /// Upper-cased mnemonic; may name an unknown opcode
    pub mnemonic: String,
    pub args: Vec<String>,
    /// 1-based source line
    pub line: usize,
}

impl Instruction {
    /// Create an unlabeled instruction
    pub fn new(mnemonic: &str, args: &[&str], line: usize) -> Self {
        Instruction {
            label: None,
            mnemonic: mnemonic.to_ascii_uppercase(),
            args: args.iter().map(|a| a.to_string()).collect(),
            line,
        }
    }

    /// Attach a label
    pub fn labeled(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn opcode(&self) -> Option<OpCode> {
        OpCode::from_mnemonic(&self.mnemonic)
    }
}

/// Validated instruction with resolved operands and jump targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    In(Reg),
    Out(Reg),
    Mov { src: Reg, dst: Reg },
    Load { cell: Cell, dst: Reg },
    Store { src: Reg, cell: Cell },
    Inc(Reg),
    Dec(Reg),
    Add { src: Reg, dst: Reg },
    Sub { src: Reg, dst: Reg },
    Jump(usize),
    Jz(Reg, usize),
    Jnz(Reg, usize),
    Halt,
}

impl Op {
    pub fn opcode(&self) -> OpCode {
        match self {
            Op::In(_) => OpCode::In,
            Op::Out(_) => OpCode::Out,
            Op::Mov { .. } => OpCode::Mov,
            Op::Load { .. } => OpCode::Load,
            Op::Store { .. } => OpCode::Store,
            Op::Inc(_) => OpCode::Inc,
            Op::Dec(_) => OpCode::Dec,
            Op::Add { .. } => OpCode::Add,
            Op::Sub { .. } => OpCode::Sub,
            Op::Jump(_) => OpCode::Jump,
            Op::Jz(..) => OpCode::Jz,
            Op::Jnz(..) => OpCode::Jnz,
            Op::Halt => OpCode::Halt,
        }
    }
}
