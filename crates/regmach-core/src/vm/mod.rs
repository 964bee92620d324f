pub mod engine;
pub mod memory;
pub mod state;

pub use engine::{EnginePhase, ExecutionEngine, RunStatus};
pub use memory::Bank;
pub use state::RuntimeState;
