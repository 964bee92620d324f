//! Operand addressing
//!
//! Registers are written `R1..Rn` in source and addressed 0-based internally;
//! memory cells are written and addressed `M0..M(size-1)`.

use std::fmt;

/// Register address (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reg(pub usize);

/// Memory cell address (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell(pub usize);

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0 + 1)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.0)
    }
}

/// Why a register or memory token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandError {
    /// Token does not have the `R<k>` / `M<k>` shape
    Malformed,
    /// Token is well-formed but names a slot the machine does not have
    OutOfRange,
}

/// Resolve a register token (`R<k>`, `1 <= k <= count`, any case)
pub fn parse_register(token: &str, count: usize) -> Result<Reg, OperandError> {
    let k = parse_indexed(token, 'R')?;
    if k == 0 || k > count {
        return Err(OperandError::OutOfRange);
    }
    Ok(Reg(k - 1))
}

/// Resolve a memory token (`M<k>`, `0 <= k < size`, any case)
pub fn parse_memory(token: &str, size: usize) -> Result<Cell, OperandError> {
    let k = parse_indexed(token, 'M')?;
    if k >= size {
        return Err(OperandError::OutOfRange);
    }
    Ok(Cell(k))
}

fn parse_indexed(token: &str, prefix: char) -> Result<usize, OperandError> {
    let upper = token.trim().to_ascii_uppercase();
    let digits = upper.strip_prefix(prefix).ok_or(OperandError::Malformed)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OperandError::Malformed);
    }
    // Digit strings too long for usize are still well-formed, just unreachable.
    digits.parse::<usize>().map_err(|_| OperandError::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_are_one_based_in_source() {
        assert_eq!(parse_register("R1", 3), Ok(Reg(0)));
        assert_eq!(parse_register("r3", 3), Ok(Reg(2)));
        assert_eq!(parse_register("R0", 3), Err(OperandError::OutOfRange));
        assert_eq!(parse_register("R4", 3), Err(OperandError::OutOfRange));
    }

    #[test]
    fn malformed_tokens() {
        assert_eq!(parse_register("X1", 3), Err(OperandError::Malformed));
        assert_eq!(parse_register("R", 3), Err(OperandError::Malformed));
        assert_eq!(parse_register("R-1", 3), Err(OperandError::Malformed));
        assert_eq!(parse_memory("M1a", 3), Err(OperandError::Malformed));
    }

    #[test]
    fn memory_is_zero_based() {
        assert_eq!(parse_memory("m0", 1), Ok(Cell(0)));
        assert_eq!(parse_memory("M5", 3), Err(OperandError::OutOfRange));
        assert_eq!(parse_memory("M0", 0), Err(OperandError::OutOfRange));
    }

    #[test]
    fn display_uses_source_numbering() {
        assert_eq!(Reg(0).to_string(), "R1");
        assert_eq!(Cell(2).to_string(), "M2");
    }
}
