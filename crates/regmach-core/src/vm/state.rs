//! Runtime State
//!
//! Everything one engine mutates while executing: registers, memory, the I/O
//! queues, the instruction pointer, the halt flag and the trace.

use std::collections::VecDeque;

use serde::Serialize;

use super::memory::Bank;
use crate::machine::MachineConfig;

/// Mutable machine state, rebuilt from scratch on every reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeState {
    pub(crate) registers: Bank,
    pub(crate) memory: Bank,
    pub(crate) input_queue: VecDeque<i64>,
    pub(crate) output_queue: Vec<i64>,
    pub(crate) instruction_pointer: usize,
    pub(crate) halted: bool,
    pub(crate) steps: u64,
    pub(crate) trace: Vec<String>,
}

impl RuntimeState {
    /// Fresh state for `config`.
    ///
    /// The input queue holds `inputs`, padded with zeros up to the configured
    /// input capacity.
    pub fn new(config: &MachineConfig, inputs: &[i64]) -> Self {
        let mut input_queue: VecDeque<i64> = inputs.iter().copied().collect();
        if input_queue.len() < config.input_capacity() {
            input_queue.resize(config.input_capacity(), 0);
        }

        RuntimeState {
            registers: Bank::new(config.register_count()),
            memory: Bank::new(config.memory_size()),
            input_queue,
            output_queue: Vec::new(),
            instruction_pointer: 0,
            halted: false,
            steps: 0,
            trace: Vec::new(),
        }
    }

    pub fn registers(&self) -> &[i64] {
        self.registers.as_slice()
    }

    pub fn memory(&self) -> &[i64] {
        self.memory.as_slice()
    }

    pub fn input_queue(&self) -> &VecDeque<i64> {
        &self.input_queue
    }

    pub fn output_queue(&self) -> &[i64] {
        &self.output_queue
    }

    pub fn instruction_pointer(&self) -> usize {
        self.instruction_pointer
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Instructions executed since the last reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    pub(crate) fn log(&mut self, line: String) {
        self.trace.push(line);
    }
}
