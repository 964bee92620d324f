//! Execution Engine
//!
//! Owns one machine configuration, the currently loaded program and the
//! runtime state it drives. Programs only enter the engine through the
//! validator, so execution itself has no failure path: an instruction
//! pointer outside the program halts the machine and an empty input queue
//! reads as 0.
//!
//! Continuous runs are cooperative. [`ExecutionEngine::start_run`] arms a step
//! budget and the caller drives the run with [`ExecutionEngine::tick`], one
//! instruction per call, until it reports something other than
//! [`RunStatus::Continue`].

use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;

use super::state::RuntimeState;
use crate::config::EngineLimits;
use crate::error::{EngineError, EngineResult, ValidationErrors};
use crate::isa::{Instruction, Op, Program};
use crate::loader::{decode, parse};
use crate::machine::{InputMode, MachineConfig, OutputMode};
use crate::render::format_instruction;

/// Coarse engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    /// No program loaded
    Idle,
    /// Program loaded and executable
    Running,
    /// HALT executed or the instruction pointer left the program
    Halted,
}

/// Outcome of one [`ExecutionEngine::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// One instruction executed, more may follow
    Continue,
    Halted,
    BudgetExhausted,
    /// No run is armed
    Stopped,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RunStatus::Continue => "running",
            RunStatus::Halted => "halted",
            RunStatus::BudgetExhausted => "step budget exhausted",
            RunStatus::Stopped => "stopped",
        };
        f.write_str(text)
    }
}

/// A validated program together with its lowered form
#[derive(Debug, Clone)]
struct LoadedProgram {
    source: Program,
    ops: Vec<Op>,
}

impl LoadedProgram {
    fn fetch(&self, ip: usize) -> Option<(&Instruction, Op)> {
        Some((self.source.get(ip)?, *self.ops.get(ip)?))
    }
}

/// Step budget of the run in progress
#[derive(Debug, Clone, Copy)]
struct ActiveRun {
    budget: u64,
    executed: u64,
}

/// Register machine interpreter
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    machine: MachineConfig,
    limits: EngineLimits,
    program: Option<LoadedProgram>,
    inputs: Vec<i64>,
    state: RuntimeState,
    run: Option<ActiveRun>,
}

impl ExecutionEngine {
    /// Create an idle engine for `machine`
    pub fn new(machine: MachineConfig, limits: EngineLimits) -> Self {
        let state = RuntimeState::new(&machine, &[]);
        ExecutionEngine {
            machine,
            limits,
            program: None,
            inputs: Vec::new(),
            state,
            run: None,
        }
    }

    /// Validate `program` against the current machine and install it.
    ///
    /// On success the state is reset with the last initial inputs. On failure
    /// the previously loaded program stays in place.
    pub fn load(&mut self, program: Program) -> Result<(), ValidationErrors> {
        self.stop();
        let ops = decode(&program, &self.machine).map_err(|errors| {
            warn!("program rejected with {} error(s)", errors.len());
            errors
        })?;

        info!(
            "loaded program: {} instruction(s), {} label(s)",
            program.len(),
            program.labels().len()
        );
        self.program = Some(LoadedProgram {
            source: program,
            ops,
        });
        self.rebuild_state();
        Ok(())
    }

    /// Parse and load program source
    pub fn load_source(&mut self, source: &str) -> EngineResult<()> {
        let program = parse(source)?;
        self.load(program)?;
        Ok(())
    }

    /// Rebuild the runtime state with fresh initial inputs
    pub fn reset(&mut self, inputs: &[i64]) {
        self.stop();
        self.inputs = inputs.to_vec();
        self.rebuild_state();
        info!("engine reset with {} input value(s)", self.inputs.len());
    }

    /// Switch to another machine.
    ///
    /// The loaded program is validated again; if it no longer fits it is
    /// unloaded and the errors are returned.
    pub fn reconfigure(&mut self, machine: MachineConfig) -> Result<(), ValidationErrors> {
        self.stop();
        self.machine = machine;

        let result = match self.program.take() {
            Some(loaded) => match decode(&loaded.source, &self.machine) {
                Ok(ops) => {
                    self.program = Some(LoadedProgram {
                        source: loaded.source,
                        ops,
                    });
                    Ok(())
                }
                Err(errors) => {
                    warn!("loaded program does not fit the new machine, unloading");
                    Err(errors)
                }
            },
            None => Ok(()),
        };

        self.rebuild_state();
        result
    }

    /// Execute exactly one instruction
    pub fn step(&mut self) {
        if self.state.halted {
            self.state.log("machine is halted, reset to run again".to_string());
            return;
        }

        let ip = self.state.instruction_pointer;
        let Some((instr, op)) = self.program.as_ref().and_then(|p| p.fetch(ip)) else {
            self.state.log(format!("#{} is outside the program, halting", ip));
            self.halt();
            return;
        };

        let line = format!("#{} {}", ip, format_instruction(instr));
        debug!("{}", line);
        self.state.log(line);
        self.state.steps += 1;

        let next = execute(&mut self.state, &self.machine, op, ip);
        self.state.instruction_pointer = next;

        if op == Op::Halt {
            self.state.log("HALT".to_string());
            self.halt();
        }
    }

    /// Arm a continuous run.
    ///
    /// With no program loaded, `fallback` is validated and loaded first; its
    /// validation errors are returned and the run does not start. A halted
    /// machine is reset before the run begins.
    pub fn start_run(&mut self, fallback: Option<&Program>) -> EngineResult<()> {
        if self.program.is_none() {
            let program = fallback.ok_or(EngineError::NoProgram)?;
            self.load(program.clone())?;
        }
        if self.state.halted {
            self.stop();
            self.rebuild_state();
        }

        info!("run started, budget {} step(s)", self.limits.step_budget);
        self.run = Some(ActiveRun {
            budget: self.limits.step_budget,
            executed: 0,
        });
        Ok(())
    }

    /// Advance an armed run by one instruction
    pub fn tick(&mut self) -> RunStatus {
        let Some(run) = self.run.as_mut() else {
            return RunStatus::Stopped;
        };

        if run.executed >= run.budget {
            let executed = run.executed;
            self.run = None;
            warn!("step budget exhausted after {} steps", executed);
            self.state
                .log(format!("step budget exhausted after {} steps", executed));
            return RunStatus::BudgetExhausted;
        }
        run.executed += 1;

        self.step();
        if self.state.halted {
            self.run = None;
            RunStatus::Halted
        } else {
            RunStatus::Continue
        }
    }

    /// Cancel the current run; no-op when nothing is running
    pub fn stop(&mut self) {
        if self.run.take().is_some() {
            info!("run stopped");
            self.state.log("run stopped".to_string());
        }
    }

    /// Start a run and tick it until it ends, without delay
    pub fn run_to_completion(&mut self, fallback: Option<&Program>) -> EngineResult<RunStatus> {
        self.start_run(fallback)?;
        loop {
            let status = self.tick();
            if status != RunStatus::Continue {
                return Ok(status);
            }
        }
    }

    pub fn machine(&self) -> &MachineConfig {
        &self.machine
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref().map(|p| &p.source)
    }

    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    pub fn registers(&self) -> &[i64] {
        self.state.registers()
    }

    pub fn memory(&self) -> &[i64] {
        self.state.memory()
    }

    pub fn input_queue(&self) -> Vec<i64> {
        self.state.input_queue().iter().copied().collect()
    }

    pub fn output_queue(&self) -> &[i64] {
        self.state.output_queue()
    }

    pub fn instruction_pointer(&self) -> usize {
        self.state.instruction_pointer()
    }

    pub fn is_halted(&self) -> bool {
        self.state.is_halted()
    }

    pub fn trace(&self) -> &[String] {
        self.state.trace()
    }

    pub fn steps_executed(&self) -> u64 {
        self.state.steps()
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn phase(&self) -> EnginePhase {
        if self.program.is_none() {
            EnginePhase::Idle
        } else if self.state.halted {
            EnginePhase::Halted
        } else {
            EnginePhase::Running
        }
    }

    fn rebuild_state(&mut self) {
        self.state = RuntimeState::new(&self.machine, &self.inputs);
    }

    fn halt(&mut self) {
        self.state.halted = true;
        self.run = None;
        info!(
            "machine halted after {} step(s) at #{}",
            self.state.steps, self.state.instruction_pointer
        );
    }
}

/// Apply one operation and return the next instruction pointer
fn execute(state: &mut RuntimeState, machine: &MachineConfig, op: Op, ip: usize) -> usize {
    let next = ip + 1;
    let regs = &mut state.registers;

    match op {
        // I/O
        Op::In(r) => {
            let mode = machine.register(r).map_or(InputMode::None, |s| s.input);
            match mode {
                InputMode::Queue => {
                    let value = state.input_queue.pop_front().unwrap_or(0);
                    regs.store(r.0, value);
                }
                InputMode::Const(value) => regs.store(r.0, value),
                InputMode::None => {}
            }
        }
        Op::Out(r) => {
            let mode = machine.register(r).map_or(OutputMode::None, |s| s.output);
            let value = regs.load(r.0);
            match mode {
                OutputMode::Push => state.output_queue.push(value),
                OutputMode::Mem(cell) => state.memory.store(cell.0, value),
                OutputMode::None => {}
            }
        }

        // Data movement
        Op::Mov { src, dst } => regs.store(dst.0, regs.load(src.0)),
        Op::Load { cell, dst } => regs.store(dst.0, state.memory.load(cell.0)),
        Op::Store { src, cell } => state.memory.store(cell.0, regs.load(src.0)),

        // Arithmetic
        Op::Inc(r) => regs.store(r.0, regs.load(r.0).wrapping_add(1)),
        Op::Dec(r) => regs.store(r.0, regs.load(r.0).wrapping_sub(1)),
        Op::Add { src, dst } => regs.store(dst.0, regs.load(dst.0).wrapping_add(regs.load(src.0))),
        Op::Sub { src, dst } => regs.store(dst.0, regs.load(dst.0).wrapping_sub(regs.load(src.0))),

        // Control flow
        Op::Jump(target) => return target,
        Op::Jz(r, target) if regs.load(r.0) == 0 => return target,
        Op::Jnz(r, target) if regs.load(r.0) != 0 => return target,
        Op::Jz(..) | Op::Jnz(..) | Op::Halt => {}
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{InputModeTag, MachineParams, OutputModeTag};

    fn engine(registers: usize, memory: usize) -> ExecutionEngine {
        let mut params = MachineParams::new(registers);
        params.memory_size = memory;
        let machine = MachineConfig::build(&params).expect("config");
        ExecutionEngine::new(machine, EngineLimits::default())
    }

    fn loaded(source: &str, registers: usize, memory: usize) -> ExecutionEngine {
        let mut engine = engine(registers, memory);
        engine.load_source(source).expect("load");
        engine
    }

    #[test]
    fn new_engine_is_idle() {
        let engine = engine(2, 1);
        assert_eq!(engine.phase(), EnginePhase::Idle);
        assert_eq!(engine.registers(), &[0, 0]);
        assert!(engine.trace().is_empty());
    }

    #[test]
    fn step_traces_label_and_instruction() {
        let mut engine = loaded("start: INC R1\nHALT", 1, 0);
        engine.step();
        assert_eq!(engine.trace(), &["#0 start: INC R1".to_string()]);
        assert_eq!(engine.registers(), &[1]);
        assert_eq!(engine.instruction_pointer(), 1);

        engine.step();
        assert!(engine.is_halted());
        assert_eq!(engine.phase(), EnginePhase::Halted);
        assert_eq!(engine.trace().last().map(String::as_str), Some("HALT"));
    }

    #[test]
    fn falling_off_the_end_halts() {
        let mut engine = loaded("INC R1", 1, 0);
        engine.step();
        assert!(!engine.is_halted());
        engine.step();
        assert!(engine.is_halted());
        assert_eq!(engine.steps_executed(), 1);

        // Further steps only record that the machine is halted
        let before = engine.registers().to_vec();
        engine.step();
        assert_eq!(engine.registers(), &before[..]);
        assert_eq!(engine.trace().len(), 3);
    }

    #[test]
    fn arithmetic_does_not_clamp() {
        let mut engine = loaded("DEC R1\nSUB R2, R1\nADD R1, R2\nHALT", 2, 0);
        engine.reset(&[]);
        engine.run_to_completion(None).expect("run");
        assert_eq!(engine.registers(), &[-1, -1]);
    }

    #[test]
    fn memory_round_trip() {
        let mut engine = loaded("IN R1\nSTORE R1, M2\nLOAD M2, R2\nMOV R2, R3\nHALT", 3, 3);
        engine.reset(&[7]);
        engine.run_to_completion(None).expect("run");
        assert_eq!(engine.memory(), &[0, 0, 7]);
        assert_eq!(engine.registers(), &[7, 7, 7]);
    }

    #[test]
    fn io_modes() {
        let mut params = MachineParams::new(3);
        params.memory_size = 2;
        params.register_input_mode.insert("R2".into(), InputModeTag::Const);
        params.register_input_const.insert("R2".into(), 42);
        params.register_input_mode.insert("R3".into(), InputModeTag::None);
        params.register_output_mode.insert("R1".into(), OutputModeTag::Push);
        params.register_output_mode.insert("R2".into(), OutputModeTag::Mem);
        params.register_output_mem.insert("R2".into(), 1);
        let machine = MachineConfig::build(&params).expect("config");

        let mut engine = ExecutionEngine::new(machine, EngineLimits::default());
        engine
            .load_source("IN R1\nIN R1\nIN R2\nIN R3\nOUT R1\nOUT R2\nOUT R3\nHALT")
            .expect("load");
        engine.reset(&[5]);
        engine.run_to_completion(None).expect("run");

        // Second IN R1 finds the queue empty and reads 0
        assert_eq!(engine.registers(), &[0, 42, 0]);
        assert_eq!(engine.output_queue(), &[0]);
        assert_eq!(engine.memory(), &[0, 42]);
    }

    #[test]
    fn jump_sets_instruction_pointer() {
        let mut engine = loaded("JUMP end\nINC R1\nINC R1\nend: HALT", 1, 0);
        engine.step();
        assert_eq!(engine.instruction_pointer(), 3);
        assert_eq!(engine.registers(), &[0]);
    }

    #[test]
    fn conditional_jumps() {
        let mut engine = loaded("JNZ R1, skip\nJZ R1, skip\nINC R1\nskip: HALT", 1, 0);
        engine.step();
        assert_eq!(engine.instruction_pointer(), 1);
        engine.step();
        assert_eq!(engine.instruction_pointer(), 3);
    }

    #[test]
    fn jnz_jumps_on_non_zero() {
        let mut engine = loaded("INC R1\nJNZ R1, skip\nINC R1\nskip: HALT", 1, 0);
        engine.step();
        engine.step();
        assert_eq!(engine.instruction_pointer(), 3);
        assert_eq!(engine.registers(), &[1]);
    }

    #[test]
    fn jz_falls_through_on_non_zero() {
        let mut engine = loaded("INC R1\nJZ R1, skip\nINC R1\nskip: HALT", 1, 0);
        engine.step();
        engine.step();
        assert_eq!(engine.instruction_pointer(), 2);
        engine.step();
        assert_eq!(engine.registers(), &[2]);
    }

    #[test]
    fn load_disarms_active_run() {
        let mut engine = loaded("loop: INC R1\nJUMP loop", 1, 0);
        engine.start_run(None).expect("start");
        assert_eq!(engine.tick(), RunStatus::Continue);

        engine.load_source("INC R1\nHALT").expect("load");
        assert!(!engine.is_running());
        assert_eq!(engine.tick(), RunStatus::Stopped);
        assert_eq!(engine.registers(), &[0]);
    }

    #[test]
    fn reset_disarms_active_run() {
        let mut engine = loaded("loop: INC R1\nJUMP loop", 1, 0);
        engine.start_run(None).expect("start");
        assert_eq!(engine.tick(), RunStatus::Continue);

        engine.reset(&[]);
        assert!(!engine.is_running());
        assert_eq!(engine.tick(), RunStatus::Stopped);
        assert_eq!(engine.steps_executed(), 0);
    }

    #[test]
    fn rejected_load_keeps_previous_program() {
        let mut engine = loaded("INC R1\nHALT", 1, 0);
        let err = engine.load_source("JUMP missing").unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(engine.program().map(Program::len), Some(2));
    }

    #[test]
    fn budget_stops_endless_loop() {
        let mut engine = engine(1, 0);
        engine.limits = EngineLimits::new().with_step_budget(10);
        engine.load_source("loop: INC R1\nJUMP loop").expect("load");

        let status = engine.run_to_completion(None).expect("run");
        assert_eq!(status, RunStatus::BudgetExhausted);
        assert_eq!(engine.steps_executed(), 10);
        assert_eq!(engine.registers(), &[5]);
        assert_eq!(
            engine.trace().last().map(String::as_str),
            Some("step budget exhausted after 10 steps")
        );
        assert!(!engine.is_running());
    }

    #[test]
    fn stop_cancels_before_next_tick() {
        let mut engine = loaded("loop: INC R1\nJUMP loop", 1, 0);
        engine.start_run(None).expect("start");
        assert_eq!(engine.tick(), RunStatus::Continue);
        engine.stop();
        assert_eq!(engine.tick(), RunStatus::Stopped);
        assert_eq!(engine.steps_executed(), 1);

        // Stopping twice is harmless
        engine.stop();
        assert_eq!(engine.trace().iter().filter(|l| *l == "run stopped").count(), 1);
    }

    #[test]
    fn start_run_without_program() {
        let mut engine = engine(1, 0);
        assert!(matches!(engine.start_run(None), Err(EngineError::NoProgram)));

        let bad = parse("JUMP nowhere").expect("parse");
        assert!(matches!(
            engine.start_run(Some(&bad)),
            Err(EngineError::Validation(_))
        ));
        assert!(!engine.is_running());

        let good = parse("INC R1\nHALT").expect("parse");
        engine.start_run(Some(&good)).expect("start");
        assert!(engine.is_running());
    }

    #[test]
    fn start_run_resets_halted_machine() {
        let mut engine = loaded("INC R1\nHALT", 1, 0);
        assert_eq!(engine.run_to_completion(None).expect("run"), RunStatus::Halted);
        assert_eq!(engine.run_to_completion(None).expect("run"), RunStatus::Halted);
        assert_eq!(engine.registers(), &[1]);
    }

    #[test]
    fn reset_discards_trace_and_loads_inputs() {
        let mut engine = loaded("IN R1\nHALT", 1, 0);
        engine.step();
        engine.reset(&[9]);
        assert!(engine.trace().is_empty());
        assert_eq!(engine.input_queue(), vec![9]);
        assert_eq!(engine.instruction_pointer(), 0);
    }

    #[test]
    fn reconfigure_unloads_program_that_no_longer_fits() {
        let mut engine = loaded("INC R2\nHALT", 2, 0);
        let smaller = MachineConfig::with_registers(1).expect("config");
        let errors = engine.reconfigure(smaller).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(engine.phase(), EnginePhase::Idle);
        assert_eq!(engine.registers(), &[0]);
    }
}
