//! Snapshot files
//!
//! Machines are persisted as pretty-printed JSON snapshots, optionally
//! carrying program source.

use std::fs;
use std::path::Path;

use log::info;
use regmach_core::{MachineConfig, MachineSnapshot};

use crate::error::{HostError, HostResult};

/// Write `config` (and `program`, if given) to `path`
pub fn save_snapshot(
    path: impl AsRef<Path>,
    config: &MachineConfig,
    program: Option<&str>,
) -> HostResult<()> {
    let path = path.as_ref();
    let json = MachineSnapshot::new(config, program).to_json()?;
    fs::write(path, json).map_err(|source| HostError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("saved machine snapshot to {}", path.display());
    Ok(())
}

/// Read a snapshot back into a machine and its embedded program source
pub fn load_snapshot(path: impl AsRef<Path>) -> HostResult<(MachineConfig, Option<String>)> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| HostError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = MachineSnapshot::from_json(&text)?.into_config()?;
    info!("loaded machine snapshot from {}", path.display());
    Ok(loaded)
}
