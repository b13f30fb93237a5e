//! Kernel RNG injection and pool sizing.
//!
//! Seeds are handed to the kernel with an explicit credit: either every
//! bit or none. Buffers larger than [`MAX_SEED_LEN`] are refused outright.

#[allow(unsafe_code)]
mod ioctl;
mod mock;
mod pool_size;

pub use ioctl::RndAddEntropy;
pub use mock::{Injection, RecordingSeeder};
pub use pool_size::{optimal_seed_len, parse_pool_bits, seed_len_for_pool_bits, POOL_SIZE_PATH};

use crate::credit::Credit;
use crate::store::MAX_SEED_LEN;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while seeding the kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("seed of {len} bytes exceeds the {max}-byte kernel limit", max = MAX_SEED_LEN)]
    TooLarge { len: usize },
    #[error("unable to open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("unable to seed the kernel: {0}")]
    AddEntropy(#[source] io::Error),
}

/// Trait for anything that can feed the kernel RNG.
pub trait KernelSeeder {
    /// Mixes `seed` into the kernel pool, crediting it according to `credit`.
    fn inject(&mut self, seed: &[u8], credit: Credit) -> Result<(), KernelError>;
}

impl<K: KernelSeeder + ?Sized> KernelSeeder for &mut K {
    fn inject(&mut self, seed: &[u8], credit: Credit) -> Result<(), KernelError> {
        (**self).inject(seed, credit)
    }
}

/// Validates a seed for injection and returns the bits to credit.
pub fn credit_bits(seed: &[u8], credit: Credit) -> Result<usize, KernelError> {
    if seed.len() > MAX_SEED_LEN {
        return Err(KernelError::TooLarge { len: seed.len() });
    }
    Ok(credit.bits_for(seed.len()))
}
