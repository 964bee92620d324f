//! Register permission sets
//!
//! Small bitmask sets over [`OpCode`] and [`TestKind`]. Membership is by tag;
//! iteration always follows catalog order, never insertion order.

use super::opcode::{OpCode, TestKind};

/// Set of opcodes a register may be used with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OpSet(u16);

impl OpSet {
    pub const fn empty() -> Self {
        OpSet(0)
    }

    /// Every register-gated opcode
    pub fn full() -> Self {
        OpCode::REGISTER_OPS.into_iter().collect()
    }

    pub fn allow(&mut self, op: OpCode) {
        self.0 |= 1 << op as u16;
    }

    pub fn deny(&mut self, op: OpCode) {
        self.0 &= !(1 << op as u16);
    }

    pub fn allows(&self, op: OpCode) -> bool {
        self.0 & (1 << op as u16) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = OpCode> + '_ {
        OpCode::ALL.into_iter().filter(move |op| self.allows(*op))
    }
}

impl FromIterator<OpCode> for OpSet {
    fn from_iter<I: IntoIterator<Item = OpCode>>(iter: I) -> Self {
        let mut set = OpSet::empty();
        for op in iter {
            set.allow(op);
        }
        set
    }
}

/// Set of tests a register may be examined with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TestSet(u8);

impl TestSet {
    pub const fn empty() -> Self {
        TestSet(0)
    }

    pub fn full() -> Self {
        TestKind::ALL.into_iter().collect()
    }

    pub fn allow(&mut self, test: TestKind) {
        self.0 |= 1 << test as u8;
    }

    pub fn deny(&mut self, test: TestKind) {
        self.0 &= !(1 << test as u8);
    }

    pub fn allows(&self, test: TestKind) -> bool {
        self.0 & (1 << test as u8) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = TestKind> + '_ {
        TestKind::ALL.into_iter().filter(move |t| self.allows(*t))
    }
}

impl FromIterator<TestKind> for TestSet {
    fn from_iter<I: IntoIterator<Item = TestKind>>(iter: I) -> Self {
        let mut set = TestSet::empty();
        for test in iter {
            set.allow(test);
        }
        set
    }
}
