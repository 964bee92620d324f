//! Engine Configuration
//!
//! Defines runtime limits for the execution engine.
//! Configuration specifies constraints only; enforcement is handled by the engine.

use std::time::Duration;

/// Default maximum number of instructions a continuous run may execute
pub const DEFAULT_STEP_BUDGET: u64 = 1000;

/// Engine limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLimits {
    /// Maximum instructions executed by one continuous run
    pub step_budget: u64,

    /// Delay between steps of a timed run
    pub tick_interval: Duration,
}

impl Default for EngineLimits {
    fn default() -> Self {
        EngineLimits {
            step_budget: DEFAULT_STEP_BUDGET,
            tick_interval: Duration::from_millis(250),
        }
    }
}

impl EngineLimits {
    /// Create limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step_budget(mut self, budget: u64) -> Self {
        self.step_budget = budget;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}
