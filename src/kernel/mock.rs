//! Recording kernel seeder for testing.

use super::{credit_bits, KernelError, KernelSeeder};
use crate::credit::Credit;
use std::io;

/// One observed injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    /// The bytes handed to the kernel.
    pub seed: Vec<u8>,
    /// Bits of entropy the kernel was told to credit.
    pub credit_bits: usize,
}

/// Kernel seeder that records requests instead of issuing them.
#[derive(Debug, Default)]
pub struct RecordingSeeder {
    injections: Vec<Injection>,
    fail: bool,
}

impl RecordingSeeder {
    /// A seeder that accepts every valid request.
    pub fn new() -> Self {
        Self::default()
    }

    /// A seeder that validates and records, then reports permission denied.
    pub fn failing() -> Self {
        Self {
            injections: Vec::new(),
            fail: true,
        }
    }

    /// All injections seen so far, in order.
    pub fn injections(&self) -> &[Injection] {
        &self.injections
    }
}

impl KernelSeeder for RecordingSeeder {
    fn inject(&mut self, seed: &[u8], credit: Credit) -> Result<(), KernelError> {
        let bits = credit_bits(seed, credit)?;
        self.injections.push(Injection {
            seed: seed.to_vec(),
            credit_bits: bits,
        });
        if self.fail {
            return Err(KernelError::AddEntropy(io::Error::from_raw_os_error(
                libc::EPERM,
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_credit_bits() {
        let mut seeder = RecordingSeeder::new();
        seeder.inject(&[1u8; 16], Credit::Credited).unwrap();
        seeder.inject(&[2u8; 16], Credit::Uncredited).unwrap();

        assert_eq!(seeder.injections()[0].credit_bits, 128);
        assert_eq!(seeder.injections()[1].credit_bits, 0);
    }

    #[test]
    fn test_failing_seeder_still_records() {
        let mut seeder = RecordingSeeder::failing();
        assert!(seeder.inject(&[1u8; 16], Credit::Credited).is_err());
        assert_eq!(seeder.injections().len(), 1);
    }
}
