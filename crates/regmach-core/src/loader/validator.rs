//! Program Validator
//!
//! Checks a parsed [`Program`] against one [`MachineConfig`] and lowers it to
//! typed [`Op`]s. A single pass visits every instruction in source order and
//! accumulates every finding; it never stops at the first error.

use crate::error::{ValidationError, ValidationErrorKind, ValidationErrors};
use crate::isa::operand::{parse_memory, parse_register, OperandError};
use crate::isa::{Cell, Instruction, Op, OpCode, Program, Reg};
use crate::machine::MachineConfig;

/// Check `program` against `config`
pub fn validate(program: &Program, config: &MachineConfig) -> Result<(), ValidationErrors> {
    decode(program, config).map(|_| ())
}

/// Validate and resolve every instruction to an [`Op`]
pub fn decode(program: &Program, config: &MachineConfig) -> Result<Vec<Op>, ValidationErrors> {
    let mut ops = Vec::with_capacity(program.len());
    let mut errors = Vec::new();

    for instr in program.instructions() {
        let mut check = InstructionCheck {
            instr,
            program,
            config,
            errors: &mut errors,
        };
        if let Some(op) = check.run() {
            ops.push(op);
        }
    }

    if errors.is_empty() {
        Ok(ops)
    } else {
        Err(ValidationErrors::new(errors))
    }
}

/// Checks for a single instruction; findings go straight into the shared list
struct InstructionCheck<'a> {
    instr: &'a Instruction,
    program: &'a Program,
    config: &'a MachineConfig,
    errors: &'a mut Vec<ValidationError>,
}

impl InstructionCheck<'_> {
    fn run(&mut self) -> Option<Op> {
        let Some(opcode) = self.instr.opcode() else {
            self.report(ValidationErrorKind::UnknownOpcode {
                mnemonic: self.instr.mnemonic.clone(),
            });
            return None;
        };

        if self.instr.args.len() != opcode.arity() {
            self.report(ValidationErrorKind::Arity {
                opcode,
                expected: opcode.arity(),
                found: self.instr.args.len(),
            });
            return None;
        }

        match opcode {
            OpCode::In | OpCode::Out | OpCode::Inc | OpCode::Dec => {
                let reg = self.register(0);
                self.require_op(reg, opcode);
                let reg = reg?;
                Some(match opcode {
                    OpCode::In => Op::In(reg),
                    OpCode::Out => Op::Out(reg),
                    OpCode::Inc => Op::Inc(reg),
                    _ => Op::Dec(reg),
                })
            }
            OpCode::Mov | OpCode::Add | OpCode::Sub => {
                let src = self.register(0);
                let dst = self.register(1);
                self.require_op(dst, opcode);
                let (src, dst) = (src?, dst?);
                Some(match opcode {
                    OpCode::Mov => Op::Mov { src, dst },
                    OpCode::Add => Op::Add { src, dst },
                    _ => Op::Sub { src, dst },
                })
            }
            OpCode::Load => {
                let cell = self.memory(0);
                let dst = self.register(1);
                self.require_op(dst, opcode);
                Some(Op::Load {
                    cell: cell?,
                    dst: dst?,
                })
            }
            OpCode::Store => {
                let src = self.register(0);
                self.require_op(src, opcode);
                let cell = self.memory(1);
                Some(Op::Store {
                    src: src?,
                    cell: cell?,
                })
            }
            OpCode::Jump => self.label(0).map(Op::Jump),
            OpCode::Jz | OpCode::Jnz => {
                let reg = self.register(0);
                self.require_test(reg, opcode);
                let target = self.label(1);
                let (reg, target) = (reg?, target?);
                Some(if opcode == OpCode::Jz {
                    Op::Jz(reg, target)
                } else {
                    Op::Jnz(reg, target)
                })
            }
            OpCode::Halt => Some(Op::Halt),
        }
    }

    fn report(&mut self, kind: ValidationErrorKind) {
        self.errors.push(ValidationError {
            line: self.instr.line,
            kind,
        });
    }

    fn register(&mut self, position: usize) -> Option<Reg> {
        let instr = self.instr;
        let token = &instr.args[position];
        let count = self.config.register_count();
        match parse_register(token, count) {
            Ok(reg) => Some(reg),
            Err(OperandError::Malformed) => {
                self.report(ValidationErrorKind::MalformedRegister {
                    token: token.clone(),
                });
                None
            }
            Err(OperandError::OutOfRange) => {
                self.report(ValidationErrorKind::RegisterOutOfRange {
                    token: token.to_ascii_uppercase(),
                    count,
                });
                None
            }
        }
    }

    fn memory(&mut self, position: usize) -> Option<Cell> {
        let instr = self.instr;
        let token = &instr.args[position];
        let size = self.config.memory_size();
        match parse_memory(token, size) {
            Ok(cell) => Some(cell),
            Err(OperandError::Malformed) => {
                self.report(ValidationErrorKind::MalformedMemory {
                    token: token.clone(),
                });
                None
            }
            Err(OperandError::OutOfRange) => {
                self.report(ValidationErrorKind::MemoryOutOfRange {
                    token: token.to_ascii_uppercase(),
                    size,
                });
                None
            }
        }
    }

    fn label(&mut self, position: usize) -> Option<usize> {
        let instr = self.instr;
        let label = &instr.args[position];
        let target = self.program.label_index(label);
        if target.is_none() {
            self.report(ValidationErrorKind::UndefinedLabel {
                label: label.clone(),
            });
        }
        target
    }

    /// Skipped when the register itself was already rejected
    fn require_op(&mut self, reg: Option<Reg>, opcode: OpCode) {
        if let Some(reg) = reg {
            if !self.config.allows_op(reg, opcode) {
                self.report(ValidationErrorKind::OperationNotAllowed {
                    opcode,
                    register: reg.to_string(),
                });
            }
        }
    }

    fn require_test(&mut self, reg: Option<Reg>, opcode: OpCode) {
        let (Some(reg), Some(test)) = (reg, opcode.test()) else {
            return;
        };
        if !self.config.allows_test(reg, test) {
            self.report(ValidationErrorKind::TestNotAllowed {
                test,
                opcode,
                register: reg.to_string(),
            });
        }
    }
}
