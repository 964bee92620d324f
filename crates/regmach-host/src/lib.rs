//! Host integration for the register machine
//!
//! The core engine is synchronous and owns no timers or files. This crate
//! supplies both: a tokio-driven timed runner and JSON snapshot storage.

pub mod error;
pub mod runner;
pub mod store;

pub use error::{HostError, HostResult};
pub use runner::{run_timed, stop_channel, StopListener, StopSignal};
pub use store::{load_snapshot, save_snapshot};
