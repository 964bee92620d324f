//! VM Storage Model
//!
//! Fixed-size integer banks backing the register file and memory cells.
//! Accesses are total: reads outside the bank yield 0 and writes outside it
//! are dropped. Validated programs never address outside a bank.

use serde::Serialize;

/// Fixed-size integer storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Bank {
    values: Vec<i64>,
}

impl Bank {
    /// Create a zero-filled bank
    pub fn new(size: usize) -> Self {
        Bank {
            values: vec![0; size],
        }
    }

    pub fn load(&self, index: usize) -> i64 {
        self.values.get(index).copied().unwrap_or(0)
    }

    pub fn store(&mut self, index: usize, value: i64) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let bank = Bank::new(3);
        assert_eq!(bank.as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn out_of_range_access_is_inert() {
        let mut bank = Bank::new(1);
        bank.store(5, 9);
        assert_eq!(bank.load(5), 0);
        bank.store(0, -2);
        assert_eq!(bank.load(0), -2);
    }
}
