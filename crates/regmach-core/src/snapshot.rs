//! Serializable machine description
//!
//! [`MachineParams`] is the plain-data form of a [`MachineConfig`]: register
//! maps keyed by name and permission sets written as arrays of tags. It is both
//! the raw input to [`MachineConfig::build`] and the body of a persisted
//! [`MachineSnapshot`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::machine::MachineConfig;

/// Schema tag written into every snapshot
pub const SNAPSHOT_SCHEMA: &str = "machine-config-v1";

/// Input wiring tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputModeTag {
    None,
    Queue,
    Const,
}

/// Output wiring tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputModeTag {
    None,
    Push,
    Mem,
}

/// Raw machine parameters. Registers missing from a map take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineParams {
    #[serde(alias = "regCount", alias = "registersCount")]
    pub register_count: usize,
    #[serde(default)]
    pub memory_size: usize,
    #[serde(default)]
    pub input_capacity: usize,
    #[serde(default)]
    pub output_capacity: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub register_input_mode: BTreeMap<String, InputModeTag>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub register_input_const: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub register_output_mode: BTreeMap<String, OutputModeTag>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub register_output_mem: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub allowed_ops: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub allowed_tests: BTreeMap<String, Vec<String>>,
}

impl MachineParams {
    /// Parameters for `register_count` registers with every other field defaulted
    pub fn new(register_count: usize) -> Self {
        MachineParams {
            register_count,
            memory_size: 0,
            input_capacity: 0,
            output_capacity: 0,
            register_input_mode: BTreeMap::new(),
            register_input_const: BTreeMap::new(),
            register_output_mode: BTreeMap::new(),
            register_output_mem: BTreeMap::new(),
            allowed_ops: BTreeMap::new(),
            allowed_tests: BTreeMap::new(),
        }
    }
}

fn default_schema() -> String {
    SNAPSHOT_SCHEMA.to_string()
}

/// Persisted machine, optionally carrying program source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(flatten)]
    pub machine: MachineParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
}

impl MachineSnapshot {
    pub fn new(config: &MachineConfig, program: Option<&str>) -> Self {
        MachineSnapshot {
            schema: default_schema(),
            machine: config.to_params(),
            program: program.map(str::to_string),
        }
    }

    /// Rebuild the machine, returning it with any embedded program source
    pub fn into_config(self) -> Result<(MachineConfig, Option<String>), ConfigError> {
        if self.schema != SNAPSHOT_SCHEMA {
            return Err(ConfigError::UnsupportedSchema { found: self.schema });
        }
        let config = MachineConfig::build(&self.machine)?;
        Ok((config, self.program))
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
