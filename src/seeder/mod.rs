//! The boot-time seeding run.
//!
//! A run feeds last boot's seeds to the kernel and leaves a new one for the
//! next boot:
//!
//! ```text
//! privilege → timestamps → lock → seed.no-credit → seed.credit → new seed → save
//! ```
//!
//! Only a missing privilege or a failure to lock the seed directory stops a
//! run. Every other failure is recorded in the [`RunReport`] and the run
//! carries on, since partial seeding beats none.

#[allow(unsafe_code)]
mod clock;
#[allow(unsafe_code)]
mod privilege;
mod report;
mod run;

pub use clock::now;
pub use privilege::{is_privileged, restrict_umask};
pub use report::{NewSeedError, RunReport, SeedFileError, SeededFile, Step};
pub use run::{Seeder, SeederOptions};

use crate::conditioning::SeedMixer;
use crate::config::{ConfigError, SeedConfig};
use crate::kernel::RndAddEntropy;
use crate::source::{LinuxRandom, SystemEntropy};
use crate::store::{SeedStore, StoreError};
use thiserror::Error;

/// Errors that stop a run before any seed file is touched.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("this program requires root")]
    NotPrivileged,
    #[error(transparent)]
    Lock(StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FatalError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl From<&SeedConfig> for SeederOptions {
    fn from(config: &SeedConfig) -> Self {
        Self {
            skip_credit: config.skip_credit,
            pool_size_path: config.pool_size_path.clone(),
        }
    }
}

/// Seeds the running kernel from the configured directory.
///
/// The directory lock is held until this function returns.
pub fn seed_system(config: &SeedConfig) -> Result<RunReport, FatalError> {
    seed_with(config, is_privileged())
}

fn seed_with(config: &SeedConfig, privileged: bool) -> Result<RunReport, FatalError> {
    if !privileged {
        return Err(FatalError::NotPrivileged);
    }

    let mixer = SeedMixer::new(&now());

    let store = SeedStore::open(&config.seed_dir, config.lock_mode()).map_err(FatalError::Lock)?;
    tracing::debug!(path = %store.path().display(), skip_credit = config.skip_credit, "Starting run");

    let entropy = SystemEntropy::linux(LinuxRandom::with_devices(
        &config.random_device,
        &config.urandom_device,
    ));
    let mut seeder = Seeder::new(
        store,
        entropy,
        RndAddEntropy::default(),
        SeederOptions::from(config),
    );
    Ok(seeder.run(mixer))
}
