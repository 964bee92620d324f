//! Host Error Types
//!
//! Failures from snapshot files and from engine calls made on behalf of the
//! host.

use std::path::PathBuf;

use regmach_core::{ConfigError, EngineError};
use thiserror::Error;

/// Failures at the host boundary
#[derive(Debug, Error)]
pub enum HostError {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type HostResult<T> = Result<T, HostError>;
