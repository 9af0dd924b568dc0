//! CLI command implementations

pub mod check;
pub mod phases;
pub mod run;

use anyhow::{Context, Result};
use phaseloop_runtime::LoopConfig;
use std::path::Path;

/// Load the config file if one was given, otherwise use defaults
pub fn load_config(path: Option<&str>) -> Result<LoopConfig> {
    match path {
        Some(path) => LoopConfig::load(Path::new(path))
            .with_context(|| format!("Failed to load config: {}", path)),
        None => Ok(LoopConfig::default()),
    }
}
