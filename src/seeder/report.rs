//! Outcome of one seeding run.

use crate::conditioning::ConditioningError;
use crate::credit::Credit;
use crate::kernel::KernelError;
use crate::source::EntropyError;
use crate::store::{SeedKind, SeedLenError, StoreError};
use thiserror::Error;

/// Failure while feeding a stored seed file back to the kernel.
#[derive(Debug, Error)]
pub enum SeedFileError {
    #[error(transparent)]
    Consume(#[from] StoreError),
    #[error(transparent)]
    Inject(#[from] KernelError),
}

/// Failure while producing the new seed.
#[derive(Debug, Error)]
pub enum NewSeedError {
    #[error(transparent)]
    Entropy(#[from] EntropyError),
    #[error(transparent)]
    SeedLen(#[from] SeedLenError),
    #[error(transparent)]
    Conditioning(#[from] ConditioningError),
}

/// Steps whose failure is reported in the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Reading or injecting `seed.no-credit`.
    NonCreditableSeed,
    /// Reading or injecting `seed.credit`.
    CreditableSeed,
    /// Obtaining the new seed.
    NewSeed,
    /// Opening the new seed file for writing.
    OpenNewSeed,
    /// Writing or syncing the new seed file.
    WriteNewSeed,
    /// Renaming the new seed file to its creditable name.
    PromoteNewSeed,
}

impl Step {
    /// Every step in exit-status bit order.
    pub const ALL: [Step; 6] = [
        Step::NonCreditableSeed,
        Step::CreditableSeed,
        Step::NewSeed,
        Step::OpenNewSeed,
        Step::WriteNewSeed,
        Step::PromoteNewSeed,
    ];

    /// Bit position of this step in the exit status.
    pub fn bit(self) -> u8 {
        match self {
            Step::NonCreditableSeed => 1,
            Step::CreditableSeed => 2,
            Step::NewSeed => 3,
            Step::OpenNewSeed => 4,
            Step::WriteNewSeed => 5,
            Step::PromoteNewSeed => 6,
        }
    }

    /// Stable label used in logs and metrics.
    pub fn name(self) -> &'static str {
        match self {
            Step::NonCreditableSeed => "non_creditable_seed",
            Step::CreditableSeed => "creditable_seed",
            Step::NewSeed => "new_seed",
            Step::OpenNewSeed => "open_new_seed",
            Step::WriteNewSeed => "write_new_seed",
            Step::PromoteNewSeed => "promote_new_seed",
        }
    }
}

/// A stored seed that reached the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededFile {
    /// Which file the seed came from.
    pub kind: SeedKind,
    /// Size of the seed in bits.
    pub bits: usize,
    /// Whether the kernel credited it.
    pub credit: Credit,
}

/// Everything a run did, including every non-fatal failure.
///
/// Failures are kept rather than returned so that one failing step never
/// stops the ones after it.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Seed files successfully injected, in processing order.
    pub seeded: Vec<SeededFile>,
    /// Size of the new seed in bits.
    pub new_seed_bits: usize,
    /// Whether the new seed is creditable on the next boot.
    pub new_seed_credit: Credit,
    /// Name the new seed ended up under, if it was saved.
    pub saved_as: Option<SeedKind>,
    /// Failure consuming or injecting `seed.no-credit` (exit bit 1).
    pub non_creditable_seed: Option<SeedFileError>,
    /// Failure consuming or injecting `seed.credit` (exit bit 2).
    pub creditable_seed: Option<SeedFileError>,
    /// Failure obtaining the new seed (exit bit 3).
    pub new_seed: Option<NewSeedError>,
    /// Failure opening the new seed file for writing (exit bit 4).
    pub open_new_seed: Option<StoreError>,
    /// Failure writing or syncing the new seed file (exit bit 5).
    pub write_new_seed: Option<StoreError>,
    /// Failure renaming the new seed to `seed.credit` (exit bit 6).
    pub promote_new_seed: Option<StoreError>,
}

impl RunReport {
    /// Returns true if `step` failed.
    pub fn failed(&self, step: Step) -> bool {
        match step {
            Step::NonCreditableSeed => self.non_creditable_seed.is_some(),
            Step::CreditableSeed => self.creditable_seed.is_some(),
            Step::NewSeed => self.new_seed.is_some(),
            Step::OpenNewSeed => self.open_new_seed.is_some(),
            Step::WriteNewSeed => self.write_new_seed.is_some(),
            Step::PromoteNewSeed => self.promote_new_seed.is_some(),
        }
    }

    /// Failed steps in bit order.
    pub fn failed_steps(&self) -> Vec<Step> {
        Step::ALL
            .into_iter()
            .filter(|&step| self.failed(step))
            .collect()
    }

    /// Returns true if no step failed.
    pub fn is_success(&self) -> bool {
        self.failed_steps().is_empty()
    }

    /// Exit status: one bit per failed step, zero on full success.
    pub fn exit_code(&self) -> u8 {
        self.failed_steps()
            .into_iter()
            .fold(0u8, |code, step| code | (1 << step.bit()))
    }

    /// Total bits injected from stored seed files.
    pub fn seeded_bits(&self) -> usize {
        self.seeded.iter().map(|file| file.bits).sum()
    }

    /// Total bits the kernel credited from stored seed files.
    pub fn credited_bits(&self) -> usize {
        self.seeded
            .iter()
            .map(|file| file.credit.bits_for(file.bits / 8))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn store_error(kind: SeedKind) -> StoreError {
        StoreError::Write {
            file: kind,
            source: io::Error::from(io::ErrorKind::Other),
        }
    }

    #[test]
    fn test_clean_run_exits_zero() {
        let report = RunReport::default();
        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_bits_are_distinct() {
        let mut seen = 0u8;
        for step in Step::ALL {
            let mask = 1u8 << step.bit();
            assert_eq!(seen & mask, 0);
            seen |= mask;
        }
        assert_eq!(seen, 0b0111_1110);
    }

    #[test]
    fn test_failures_combine_into_mask() {
        let report = RunReport {
            creditable_seed: Some(store_error(SeedKind::Creditable).into()),
            promote_new_seed: Some(store_error(SeedKind::NonCreditable)),
            ..RunReport::default()
        };
        assert_eq!(
            report.failed_steps(),
            vec![Step::CreditableSeed, Step::PromoteNewSeed]
        );
        assert_eq!(report.exit_code(), (1 << 2) | (1 << 6));
        assert!(!report.is_success());
    }

    #[test]
    fn test_credited_bits_only_count_credited_files() {
        let report = RunReport {
            seeded: vec![
                SeededFile {
                    kind: SeedKind::NonCreditable,
                    bits: 256,
                    credit: Credit::Uncredited,
                },
                SeededFile {
                    kind: SeedKind::Creditable,
                    bits: 512,
                    credit: Credit::Credited,
                },
            ],
            ..RunReport::default()
        };
        assert_eq!(report.seeded_bits(), 768);
        assert_eq!(report.credited_bits(), 512);
    }
}
