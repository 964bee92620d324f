//! Register Machine Error Types
//!
//! Defines every error condition produced by the core: malformed machine
//! configuration, unparseable source, and program/machine mismatches found by
//! the validator. Execution itself never fails.

use std::fmt;

use thiserror::Error;

use crate::isa::{OpCode, TestKind};

/// Malformed machine configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("register count must be at least 1")]
    NoRegisters,

    // Register keys
    #[error("`{key}` is not a register name (expected R<k>)")]
    InvalidRegister { key: String },
    #[error("register {key} out of range (machine has R1..R{count})")]
    RegisterOutOfRange { key: String, count: usize },
    #[error("register {key} is configured more than once")]
    DuplicateRegister { key: String },

    // Wiring
    #[error("register {register} outputs to M{index} but memory has {size} cells")]
    MemoryOutOfRange {
        register: String,
        index: usize,
        size: usize,
    },
    #[error("register {register} reads a constant but no constant is configured")]
    MissingInputConst { register: String },
    #[error("register {register} writes to memory but no cell is configured")]
    MissingOutputMem { register: String },

    // Permissions
    #[error("unknown operation `{tag}` for register {register}")]
    UnknownOperation { register: String, tag: String },
    #[error("unknown test `{tag}` for register {register}")]
    UnknownTest { register: String, tag: String },

    // Snapshots
    #[error("unsupported snapshot schema `{found}`")]
    UnsupportedSchema { found: String },
    #[error("invalid snapshot: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err.to_string())
    }
}

/// Source text that cannot be split into instructions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: label without an instruction")]
    MissingOpcode { line: usize },
    #[error("line {line}: invalid label `{label}`")]
    InvalidLabel { line: usize, label: String },
}

/// What the validator found wrong with one instruction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    #[error("unknown opcode `{mnemonic}`")]
    UnknownOpcode { mnemonic: String },
    #[error("{opcode} expects {expected} argument(s), found {found}")]
    Arity {
        opcode: OpCode,
        expected: usize,
        found: usize,
    },
    #[error("`{token}` is not a register (expected R<k>)")]
    MalformedRegister { token: String },
    #[error("register {token} out of range (machine has R1..R{count})")]
    RegisterOutOfRange { token: String, count: usize },
    #[error("`{token}` is not a memory cell (expected M<k>)")]
    MalformedMemory { token: String },
    #[error("memory cell {token} out of range (machine has {size} cells)")]
    MemoryOutOfRange { token: String, size: usize },
    #[error("label `{label}` not found")]
    UndefinedLabel { label: String },
    #[error("{opcode} is not allowed on {register}")]
    OperationNotAllowed { opcode: OpCode, register: String },
    #[error("test {test} (used by {opcode}) is not allowed on {register}")]
    TestNotAllowed {
        test: TestKind,
        opcode: OpCode,
        register: String,
    },
}

/// A single validation finding, tied to its source line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ValidationError {
    pub line: usize,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Every finding from one validation pass, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        ValidationErrors(errors)
    }

    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Umbrella error for engine entry points
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("program rejected:\n{0}")]
    Validation(#[from] ValidationErrors),
    #[error("no program loaded")]
    NoProgram,
}

pub type EngineResult<T> = Result<T, EngineError>;
