//! Global configuration model for the lxkit runtime.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LxkitError, Result};

/// Root configuration for the lxkit runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Default config root handed to every new container binding.
    pub config_path: PathBuf,
    /// Directory holding the `lxc-*` tools; `None` searches `$PATH`.
    pub lxc_path: Option<PathBuf>,
    /// Polling policy used by blocking waits.
    pub wait: WaitPolicy,
    /// Upper bound on how long `stop` waits for the engine to confirm.
    #[serde(with = "millis")]
    pub stop_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(crate::constants::DEFAULT_CONFIG_PATH),
            lxc_path: None,
            wait: WaitPolicy::default(),
            stop_timeout: Duration::from_secs(30),
        }
    }
}

impl RuntimeConfig {
    /// Loads a JSON configuration file; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| LxkitError::io(path, e))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os(crate::constants::CONFIG_PATH_ENV) {
            config.config_path = PathBuf::from(path);
        }
        if let Some(path) = std::env::var_os(crate::constants::LXC_PATH_ENV) {
            config.lxc_path = Some(PathBuf::from(path));
        }
        config
    }

    /// Checks that the polling policy can make progress.
    ///
    /// # Errors
    ///
    /// Returns an error if an interval is zero or the multiplier is below one.
    pub fn validate(&self) -> Result<()> {
        if self.wait.initial_interval.is_zero() || self.wait.max_interval.is_zero() {
            return Err(LxkitError::Config {
                message: "wait intervals must be non-zero".into(),
            });
        }
        if self.wait.initial_interval > self.wait.max_interval {
            return Err(LxkitError::Config {
                message: "wait.initial_interval exceeds wait.max_interval".into(),
            });
        }
        if self.wait.multiplier < 1 {
            return Err(LxkitError::Config {
                message: "wait.multiplier must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Capped exponential backoff used while polling container state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitPolicy {
    /// First sleep between polls.
    #[serde(with = "millis")]
    pub initial_interval: Duration,
    /// Ceiling on the sleep between polls.
    #[serde(with = "millis")]
    pub max_interval: Duration,
    /// Growth factor applied after each unsuccessful poll.
    pub multiplier: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(500),
            multiplier: 2,
        }
    }
}

impl WaitPolicy {
    /// Returns the interval that follows `current`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        current
            .checked_mul(self.multiplier)
            .map_or(self.max_interval, |next| next.min(self.max_interval))
    }
}

/// Durations are written as integer milliseconds in config files.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
