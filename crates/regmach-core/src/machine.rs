//! Machine Configuration
//!
//! Declarative description of one machine instance: register and memory
//! sizes, queue capacities, per-register I/O wiring and permissions.
//! A [`MachineConfig`] is immutable once built; every register has a fully
//! defined behavior, so later stages never deal with missing entries.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::isa::operand::{parse_register, OperandError};
use crate::isa::{Cell, OpCode, OpSet, Reg, TestKind, TestSet};
use crate::snapshot::{InputModeTag, MachineParams, OutputModeTag};

/// Where `IN r` takes its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    None,
    Queue,
    Const(i64),
}

/// Where `OUT r` sends its value to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    None,
    Push,
    Mem(Cell),
}

/// Behavior of a single register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSpec {
    pub input: InputMode,
    pub output: OutputMode,
    pub ops: OpSet,
    pub tests: TestSet,
}

impl Default for RegisterSpec {
    fn default() -> Self {
        RegisterSpec {
            input: InputMode::Queue,
            output: OutputMode::None,
            ops: OpSet::full(),
            tests: TestSet::full(),
        }
    }
}

/// Validated machine description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    memory_size: usize,
    input_capacity: usize,
    output_capacity: usize,
    registers: Vec<RegisterSpec>,
}

impl MachineConfig {
    /// Validate raw parameters and fill in per-register defaults
    pub fn build(params: &MachineParams) -> Result<Self, ConfigError> {
        let count = params.register_count;
        if count == 0 {
            return Err(ConfigError::NoRegisters);
        }

        let input_modes = by_register(&params.register_input_mode, count)?;
        let input_consts = by_register(&params.register_input_const, count)?;
        let output_modes = by_register(&params.register_output_mode, count)?;
        let output_cells = by_register(&params.register_output_mem, count)?;
        let allowed_ops = by_register(&params.allowed_ops, count)?;
        let allowed_tests = by_register(&params.allowed_tests, count)?;

        for (reg, index) in &output_cells {
            if **index >= params.memory_size {
                return Err(ConfigError::MemoryOutOfRange {
                    register: reg.to_string(),
                    index: **index,
                    size: params.memory_size,
                });
            }
        }

        let mut registers = vec![RegisterSpec::default(); count];

        for (reg, tag) in input_modes {
            registers[reg.0].input = match tag {
                InputModeTag::None => InputMode::None,
                InputModeTag::Queue => InputMode::Queue,
                InputModeTag::Const => {
                    let value = input_consts.get(&reg).map(|v| **v).ok_or_else(|| {
                        ConfigError::MissingInputConst {
                            register: reg.to_string(),
                        }
                    })?;
                    InputMode::Const(value)
                }
            };
        }

        for (reg, tag) in output_modes {
            registers[reg.0].output = match tag {
                OutputModeTag::None => OutputMode::None,
                OutputModeTag::Push => OutputMode::Push,
                OutputModeTag::Mem => {
                    let index = output_cells.get(&reg).map(|v| **v).ok_or_else(|| {
                        ConfigError::MissingOutputMem {
                            register: reg.to_string(),
                        }
                    })?;
                    OutputMode::Mem(Cell(index))
                }
            };
        }

        for (reg, tags) in allowed_ops {
            let mut ops = OpSet::empty();
            for tag in tags {
                let op = OpCode::from_mnemonic(tag)
                    .filter(|op| op.is_register_op())
                    .ok_or_else(|| ConfigError::UnknownOperation {
                        register: reg.to_string(),
                        tag: tag.clone(),
                    })?;
                ops.allow(op);
            }
            registers[reg.0].ops = ops;
        }

        for (reg, tags) in allowed_tests {
            let mut tests = TestSet::empty();
            for tag in tags {
                let test = TestKind::from_tag(tag).ok_or_else(|| ConfigError::UnknownTest {
                    register: reg.to_string(),
                    tag: tag.clone(),
                })?;
                tests.allow(test);
            }
            registers[reg.0].tests = tests;
        }

        Ok(MachineConfig {
            memory_size: params.memory_size,
            input_capacity: params.input_capacity,
            output_capacity: params.output_capacity,
            registers,
        })
    }

    /// Machine with `count` default registers and nothing else
    pub fn with_registers(count: usize) -> Result<Self, ConfigError> {
        Self::build(&MachineParams::new(count))
    }

    /// Convert back to the array-based serializable form.
    ///
    /// Every register is written out explicitly, so the result does not rely
    /// on defaults when rebuilt.
    pub fn to_params(&self) -> MachineParams {
        let mut params = MachineParams::new(self.register_count());
        params.memory_size = self.memory_size;
        params.input_capacity = self.input_capacity;
        params.output_capacity = self.output_capacity;

        for (reg, spec) in self.registers() {
            let key = reg.to_string();

            let input = match spec.input {
                InputMode::None => InputModeTag::None,
                InputMode::Queue => InputModeTag::Queue,
                InputMode::Const(value) => {
                    params.register_input_const.insert(key.clone(), value);
                    InputModeTag::Const
                }
            };
            params.register_input_mode.insert(key.clone(), input);

            let output = match spec.output {
                OutputMode::None => OutputModeTag::None,
                OutputMode::Push => OutputModeTag::Push,
                OutputMode::Mem(cell) => {
                    params.register_output_mem.insert(key.clone(), cell.0);
                    OutputModeTag::Mem
                }
            };
            params.register_output_mode.insert(key.clone(), output);

            params.allowed_ops.insert(
                key.clone(),
                spec.ops.iter().map(|op| op.mnemonic().to_string()).collect(),
            );
            params.allowed_tests.insert(
                key,
                spec.tests.iter().map(|t| t.tag().to_string()).collect(),
            );
        }

        params
    }

    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    pub fn memory_size(&self) -> usize {
        self.memory_size
    }

    pub fn input_capacity(&self) -> usize {
        self.input_capacity
    }

    pub fn output_capacity(&self) -> usize {
        self.output_capacity
    }

    pub fn register(&self, reg: Reg) -> Option<&RegisterSpec> {
        self.registers.get(reg.0)
    }

    /// Registers with their specs, `R1` first
    pub fn registers(&self) -> impl Iterator<Item = (Reg, &RegisterSpec)> + '_ {
        self.registers.iter().enumerate().map(|(i, spec)| (Reg(i), spec))
    }

    pub fn allows_op(&self, reg: Reg, op: OpCode) -> bool {
        self.register(reg).is_some_and(|spec| spec.ops.allows(op))
    }

    pub fn allows_test(&self, reg: Reg, test: TestKind) -> bool {
        self.register(reg).is_some_and(|spec| spec.tests.allows(test))
    }

    /// Formal 8-tuple description, see [`crate::render::describe_machine`]
    pub fn describe(&self) -> String {
        crate::render::describe_machine(self)
    }
}

/// Re-key a name-keyed map by register, rejecting unknown or repeated names
fn by_register<T>(
    map: &BTreeMap<String, T>,
    count: usize,
) -> Result<BTreeMap<Reg, &T>, ConfigError> {
    let mut out = BTreeMap::new();
    for (key, value) in map {
        let reg = parse_register(key, count).map_err(|err| match err {
            OperandError::Malformed => ConfigError::InvalidRegister { key: key.clone() },
            OperandError::OutOfRange => ConfigError::RegisterOutOfRange {
                key: key.clone(),
                count,
            },
        })?;
        if out.insert(reg, value).is_some() {
            return Err(ConfigError::DuplicateRegister { key: key.clone() });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(count: usize) -> MachineParams {
        MachineParams::new(count)
    }

    #[test]
    fn omitted_registers_take_defaults() {
        let config = MachineConfig::with_registers(2).expect("config");
        let spec = config.register(Reg(1)).expect("R2");
        assert_eq!(spec.input, InputMode::Queue);
        assert_eq!(spec.output, OutputMode::None);
        assert_eq!(spec.ops, OpSet::full());
        assert_eq!(spec.tests, TestSet::full());
    }

    #[test]
    fn zero_registers_rejected() {
        assert_eq!(
            MachineConfig::build(&params(0)).unwrap_err(),
            ConfigError::NoRegisters
        );
    }

    #[test]
    fn register_keys_must_exist() {
        let mut p = params(2);
        p.allowed_ops.insert("R3".into(), vec![]);
        assert_eq!(
            MachineConfig::build(&p).unwrap_err(),
            ConfigError::RegisterOutOfRange {
                key: "R3".into(),
                count: 2
            }
        );

        let mut p = params(2);
        p.register_input_mode.insert("A".into(), InputModeTag::None);
        assert!(matches!(
            MachineConfig::build(&p),
            Err(ConfigError::InvalidRegister { .. })
        ));
    }

    #[test]
    fn register_keys_differing_in_case_collide() {
        let mut p = params(1);
        p.allowed_ops.insert("R1".into(), vec!["INC".into()]);
        p.allowed_ops.insert("r1".into(), vec!["DEC".into()]);
        assert_eq!(
            MachineConfig::build(&p).unwrap_err(),
            ConfigError::DuplicateRegister { key: "r1".into() }
        );
    }

    #[test]
    fn const_input_needs_a_value() {
        let mut p = params(1);
        p.register_input_mode.insert("R1".into(), InputModeTag::Const);
        assert!(matches!(
            MachineConfig::build(&p),
            Err(ConfigError::MissingInputConst { .. })
        ));

        p.register_input_const.insert("r1".into(), 7);
        let config = MachineConfig::build(&p).expect("config");
        assert_eq!(
            config.register(Reg(0)).map(|s| s.input),
            Some(InputMode::Const(7))
        );
    }

    #[test]
    fn memory_output_must_fit() {
        let mut p = params(1);
        p.memory_size = 2;
        p.register_output_mode.insert("R1".into(), OutputModeTag::Mem);
        p.register_output_mem.insert("R1".into(), 2);
        assert_eq!(
            MachineConfig::build(&p).unwrap_err(),
            ConfigError::MemoryOutOfRange {
                register: "R1".into(),
                index: 2,
                size: 2
            }
        );
    }

    #[test]
    fn permission_tags_are_case_insensitive() {
        let mut p = params(1);
        p.allowed_ops
            .insert("R1".into(), vec!["inc".into(), "Dec".into()]);
        p.allowed_tests.insert("R1".into(), vec!["= 0".into()]);
        let config = MachineConfig::build(&p).expect("config");
        assert!(config.allows_op(Reg(0), OpCode::Inc));
        assert!(config.allows_op(Reg(0), OpCode::Dec));
        assert!(!config.allows_op(Reg(0), OpCode::Add));
        assert!(config.allows_test(Reg(0), TestKind::Zero));
    }

    #[test]
    fn jump_is_not_a_permission() {
        let mut p = params(1);
        p.allowed_ops.insert("R1".into(), vec!["JUMP".into()]);
        assert!(matches!(
            MachineConfig::build(&p),
            Err(ConfigError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn to_params_round_trips() {
        let mut p = params(3);
        p.memory_size = 4;
        p.input_capacity = 2;
        p.register_input_mode.insert("R2".into(), InputModeTag::Const);
        p.register_input_const.insert("R2".into(), -3);
        p.register_output_mode.insert("R3".into(), OutputModeTag::Mem);
        p.register_output_mem.insert("R3".into(), 1);
        p.allowed_ops.insert("R1".into(), vec!["IN".into()]);
        p.allowed_tests.insert("R1".into(), vec![]);

        let config = MachineConfig::build(&p).expect("config");
        let rebuilt = MachineConfig::build(&config.to_params()).expect("rebuild");
        assert_eq!(rebuilt, config);
    }
}
