//! Register Machine - Core Library
//!
//! Public API surface for the register machine: machine configuration,
//! program parsing and validation, and the stepwise execution engine.

pub mod error;
pub mod config;
pub mod isa;
pub mod loader;
pub mod machine;
pub mod render;
pub mod snapshot;
pub mod vm;

// Re-export commonly used types
pub use error::{
    ConfigError, EngineError, EngineResult, ParseError, ValidationError, ValidationErrorKind,
    ValidationErrors,
};
pub use config::EngineLimits;
pub use isa::{Instruction, OpCode, Program, TestKind};
pub use loader::{parse, validate};
pub use machine::{InputMode, MachineConfig, OutputMode, RegisterSpec};
pub use snapshot::{MachineParams, MachineSnapshot};
pub use vm::{EnginePhase, ExecutionEngine, RunStatus, RuntimeState};

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_validate_run() {
		let machine = MachineConfig::with_registers(2).expect("config");
		let program = parse("IN R1\nMOV R1, R2\nINC R2\nHALT").expect("parse");
		validate(&program, &machine).expect("valid");

		let mut engine = ExecutionEngine::new(machine, EngineLimits::new());
		engine.reset(&[41]);
		engine.load(program).expect("load");
		let status = engine.run_to_completion(None).expect("run");

		assert_eq!(status, RunStatus::Halted);
		assert_eq!(engine.registers(), &[41, 42]);
	}

	#[test]
	fn engines_do_not_share_state() {
		let machine = MachineConfig::with_registers(1).expect("config");
		let mut a = ExecutionEngine::new(machine.clone(), EngineLimits::new());
		let mut b = ExecutionEngine::new(machine, EngineLimits::new());
		a.load_source("INC R1\nINC R1\nHALT").expect("load");
		b.load_source("DEC R1\nHALT").expect("load");

		a.run_to_completion(None).expect("run");
		b.run_to_completion(None).expect("run");
		assert_eq!(a.registers(), &[2]);
		assert_eq!(b.registers(), &[-1]);
	}

	#[test]
	fn snapshot_restores_machine_and_program() {
		let machine = MachineConfig::with_registers(3).expect("config");
		let json = MachineSnapshot::new(&machine, Some("HALT"))
			.to_json()
			.expect("serialize");

		let (restored, program) = MachineSnapshot::from_json(&json)
			.and_then(MachineSnapshot::into_config)
			.expect("restore");
		assert_eq!(restored, machine);
		assert_eq!(program.as_deref(), Some("HALT"));
	}
}
