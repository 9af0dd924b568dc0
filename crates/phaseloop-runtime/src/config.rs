//! Loop configuration loaded from TOML
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock 60Hz loop over the host's stock layout with the `clear` reset policy.

use phaseloop_core::{PhaseLoopError, PhaseTag, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happens to subscriber registrations when the host rebuilds its
/// dispatch structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    /// Registries are cleared; subscribers must subscribe again.
    #[default]
    Clear,
    /// Registries are kept and re-attached to the rebuilt structure.
    Reattach,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Fixed-step rate in Hz
    pub fixed_hz: f64,
    /// Longest frame time fed into the accumulator, in seconds
    pub max_frame_time: f64,
    /// Cap on FixedUpdate steps per frame
    pub max_fixed_steps: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            fixed_hz: 60.0,
            max_frame_time: 0.25,
            max_fixed_steps: 8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub reset_policy: ResetPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Layout of the reference host's dispatch structure
    pub layout: Vec<PhaseTag>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            layout: PhaseTag::DEFAULT_LAYOUT.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub clock: ClockConfig,
    pub session: SessionConfig,
    pub host: HostConfig,
}

impl LoopConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LoopConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.clock.fixed_hz.is_finite() && self.clock.fixed_hz > 0.0) {
            return Err(PhaseLoopError::ConfigError(format!(
                "clock.fixed_hz must be positive, got {}",
                self.clock.fixed_hz
            )));
        }
        if !(self.clock.max_frame_time.is_finite() && self.clock.max_frame_time > 0.0) {
            return Err(PhaseLoopError::ConfigError(format!(
                "clock.max_frame_time must be positive, got {}",
                self.clock.max_frame_time
            )));
        }
        if self.clock.max_fixed_steps == 0 {
            return Err(PhaseLoopError::ConfigError(
                "clock.max_fixed_steps must be at least 1".to_string(),
            ));
        }
        if self.host.layout.is_empty() {
            return Err(PhaseLoopError::ConfigError(
                "host.layout must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
