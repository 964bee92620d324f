pub mod instruction;
pub mod opcode;
pub mod operand;
pub mod permission;
pub mod program;

pub use instruction::{Instruction, Op};
pub use opcode::{ArgKind, OpCode, TestKind};
pub use operand::{Cell, Reg};
pub use permission::{OpSet, TestSet};
pub use program::Program;
