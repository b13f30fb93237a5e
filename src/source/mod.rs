//! Fresh randomness from the operating system.
//!
//! The source fills a caller-owned buffer completely and reports whether
//! the bytes may be credited as entropy. Sources are tried in order of
//! quality; see [`SystemEntropy`] for the fallback chain.

#[allow(unsafe_code)]
mod linux;
mod mock;
mod system;

pub use linux::{LinuxRandom, RANDOM_DEVICE, URANDOM_DEVICE};
pub use mock::MockEntropy;
pub use system::{GetRandomMode, RandomBackend, SystemEntropy};

use crate::credit::Credit;
use std::io;
use thiserror::Error;

/// Errors that can occur while obtaining randomness.
#[derive(Debug, Error)]
pub enum EntropyError {
    #[error("unable to open blocking random device: {0}")]
    RandomDevice(#[source] io::Error),
    #[error("unable to read from non-blocking random device: {0}")]
    Urandom(#[source] io::Error),
    #[error("short read from non-blocking random device: got {got} of {want} bytes")]
    ShortRead { got: usize, want: usize },
}

/// Trait for sources of new seed material.
///
/// Implementations must either fill `dest` entirely or fail; a partially
/// filled buffer is never reported as success.
pub trait EntropySource {
    /// Fills `dest` with random bytes and reports whether they are creditable.
    fn obtain(&mut self, dest: &mut [u8]) -> Result<Credit, EntropyError>;
}

impl<S: EntropySource + ?Sized> EntropySource for &mut S {
    fn obtain(&mut self, dest: &mut [u8]) -> Result<Credit, EntropyError> {
        (**self).obtain(dest)
    }
}
