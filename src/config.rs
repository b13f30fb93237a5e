//! Run configuration.
//!
//! Settings come from built-in defaults, an optional TOML file, the
//! `SEEDRNG_SKIP_CREDIT` environment switch and command-line flags, in
//! that order of precedence.

use crate::kernel::POOL_SIZE_PATH;
use crate::source::{RANDOM_DEVICE, URANDOM_DEVICE};
use crate::store::LockMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the seed files.
pub const DEFAULT_SEED_DIR: &str = "/var/lib/seedrng";

/// Environment variable that forces the creditable seed to be injected
/// without credit.
pub const SKIP_CREDIT_ENV: &str = "SEEDRNG_SKIP_CREDIT";

/// Configuration for one seeding run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Directory holding `seed.credit` and `seed.no-credit`.
    pub seed_dir: PathBuf,
    /// Never credit the stored creditable seed.
    pub skip_credit: bool,
    /// Pseudo-file reporting the kernel pool size in bits.
    pub pool_size_path: PathBuf,
    /// Blocking device probed for readiness when getrandom is unavailable.
    pub random_device: PathBuf,
    /// Non-blocking device used as the last randomness fallback.
    pub urandom_device: PathBuf,
    /// Block until the directory lock is free (false: fail immediately).
    pub wait_for_lock: bool,
    /// Prometheus textfile to write the run summary to.
    pub metrics_file: Option<PathBuf>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            seed_dir: PathBuf::from(DEFAULT_SEED_DIR),
            skip_credit: false,
            pool_size_path: PathBuf::from(POOL_SIZE_PATH),
            random_device: PathBuf::from(RANDOM_DEVICE),
            urandom_device: PathBuf::from(URANDOM_DEVICE),
            wait_for_lock: true,
            metrics_file: None,
        }
    }
}

impl SeedConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// Keys missing from the file keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: SeedConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let paths = [
            ("seed_dir", &self.seed_dir),
            ("pool_size_path", &self.pool_size_path),
            ("random_device", &self.random_device),
            ("urandom_device", &self.urandom_device),
        ];
        for (name, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::EmptyPath(name));
            }
        }
        if matches!(&self.metrics_file, Some(path) if path.as_os_str().is_empty()) {
            return Err(ConfigError::EmptyPath("metrics_file"));
        }
        Ok(())
    }

    /// Applies a value of the skip-credit environment switch.
    ///
    /// A truthy value forces skipping; anything else leaves the setting as is.
    pub fn apply_skip_credit_env(&mut self, value: Option<&str>) {
        if value.is_some_and(is_truthy) {
            tracing::debug!(var = SKIP_CREDIT_ENV, "Crediting of stored seed disabled");
            self.skip_credit = true;
        }
    }

    /// Reads the skip-credit switch from the process environment.
    pub fn apply_env(&mut self) {
        let value = std::env::var(SKIP_CREDIT_ENV).ok();
        self.apply_skip_credit_env(value.as_deref());
    }

    /// Lock acquisition mode for the seed directory.
    pub fn lock_mode(&self) -> LockMode {
        if self.wait_for_lock {
            LockMode::Wait
        } else {
            LockMode::NoWait
        }
    }
}

/// Returns true for `1`, `true`, `yes` or `y`, ignoring ASCII case.
pub fn is_truthy(value: &str) -> bool {
    value == "1"
        || ["true", "yes", "y"]
            .iter()
            .any(|word| value.eq_ignore_ascii_case(word))
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    #[error("{0} must not be empty")]
    EmptyPath(&'static str),
}
