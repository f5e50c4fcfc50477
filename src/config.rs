//! Rig configuration
//!
//! Settings for the capture loop, the integrator and the session recorder.
//! Every field has a default, so a configuration file only needs to name
//! what it changes. Files are JSON (`.json`) or YAML (`.yaml`/`.yml`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown configuration format: {0}")]
    UnknownFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Capture loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConfig {
    /// Upper bound on a single device read, and so on shutdown latency
    pub read_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { read_timeout_ms: 50 }
    }
}

impl CaptureConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// How the integrator treats several axes above the dead zone in one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AxisPolicy {
    /// Every axis contributes independently
    #[default]
    Combine,
    /// Only the first axis above the dead zone, in priority order, contributes
    FirstMatch,
}

/// Integrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegratorConfig {
    /// Polls per second
    pub rate_hz: f64,
    /// Readings with an absolute value at or below this are ignored
    pub dead_zone: f64,
    pub policy: AxisPolicy,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            rate_hz: 100.0,
            dead_zone: 0.1,
            policy: AxisPolicy::Combine,
        }
    }
}

impl IntegratorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.rate_hz.is_finite() || self.rate_hz <= 0.0 {
            return Err(format!("rate must be positive, got {}", self.rate_hz));
        }
        if Duration::try_from_secs_f64(1.0 / self.rate_hz).is_err() {
            return Err(format!("rate {} is too low to schedule", self.rate_hz));
        }
        if !self.dead_zone.is_finite() || self.dead_zone < 0.0 {
            return Err(format!("dead zone must be non-negative, got {}", self.dead_zone));
        }
        Ok(())
    }

    /// Sleep between two ticks. Only meaningful on a validated config.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz)
    }
}

/// What happens to channel buffers when a new session starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BufferPolicy {
    /// Each session starts with empty buffers
    #[default]
    ResetOnStart,
    /// Buffers keep growing across sessions; every flush contains all of them
    Accumulate,
}

/// Session recorder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderConfig {
    /// Directory receiving archives and descriptions
    pub base_dir: PathBuf,
    /// Sampling interval between consecutive values of one record call, in seconds
    pub dt: f64,
    pub buffer_policy: BufferPolicy,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./data"),
            dt: 1e-4,
            buffer_policy: BufferPolicy::ResetOnStart,
        }
    }
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.dt.is_finite() || self.dt < 0.0 {
            return Err(format!("dt must be non-negative, got {}", self.dt));
        }
        Ok(())
    }
}

/// Complete rig configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RigConfig {
    pub capture: CaptureConfig,
    pub integrator: IntegratorConfig,
    pub recorder: RecorderConfig,
}

impl RigConfig {
    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let config: RigConfig = match extension(path).as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            other => {
                return Err(ConfigError::UnknownFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {:?}: {:?}", path, config);
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.integrator.validate().map_err(ConfigError::Invalid)?;
        self.recorder.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}
