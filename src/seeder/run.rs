//! The seeding pipeline once the directory is locked.

use super::report::{NewSeedError, RunReport, SeedFileError, SeededFile};
use crate::conditioning::{SeedMixer, FAILURE_MARKER};
use crate::credit::{Credit, CreditDecision};
use crate::kernel::{optimal_seed_len, KernelSeeder, POOL_SIZE_PATH};
use crate::source::EntropySource;
use crate::store::{SeedBuf, SeedKind, SeedStore, StoreError};
use std::path::PathBuf;

/// Knobs for a [`Seeder`] run.
#[derive(Debug, Clone)]
pub struct SeederOptions {
    /// Inject the creditable seed file without credit.
    pub skip_credit: bool,
    /// Pseudo-file reporting the kernel pool size in bits.
    pub pool_size_path: PathBuf,
}

impl Default for SeederOptions {
    fn default() -> Self {
        Self {
            skip_credit: false,
            pool_size_path: PathBuf::from(POOL_SIZE_PATH),
        }
    }
}

/// Runs the seeding protocol against a locked [`SeedStore`].
///
/// The entropy source and kernel seeder are generic so the whole pipeline
/// can be driven by test doubles.
#[derive(Debug)]
pub struct Seeder<E, K> {
    store: SeedStore,
    entropy: E,
    kernel: K,
    options: SeederOptions,
}

impl<E: EntropySource, K: KernelSeeder> Seeder<E, K> {
    /// Creates a seeder; the store's lock is held until the seeder is dropped.
    pub fn new(store: SeedStore, entropy: E, kernel: K, options: SeederOptions) -> Self {
        Self {
            store,
            entropy,
            kernel,
            options,
        }
    }

    /// The entropy source.
    pub fn entropy(&self) -> &E {
        &self.entropy
    }

    /// The kernel seeder.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Seeds the kernel from the stored seeds and saves a fresh one.
    ///
    /// `mixer` must already hold the prefix and timestamps. No step failure
    /// stops the run; all of them end up in the returned report.
    pub fn run(&mut self, mut mixer: SeedMixer) -> RunReport {
        let mut report = RunReport::default();

        let stored = [
            (SeedKind::NonCreditable, CreditDecision::Uncredited),
            (SeedKind::Creditable, CreditDecision::CreditedUnlessSkipped),
        ];
        for (kind, decision) in stored {
            match self.seed_from_file(kind, decision, &mut mixer) {
                Ok(seeded) => report.seeded.extend(seeded),
                Err(e) => {
                    tracing::error!(file = %kind, error = %e, "Unable to seed from stored seed");
                    match kind {
                        SeedKind::NonCreditable => report.non_creditable_seed = Some(e),
                        SeedKind::Creditable => report.creditable_seed = Some(e),
                    }
                }
            }
        }

        let len = optimal_seed_len(&self.options.pool_size_path);
        let (mut seed, mut credit) = self.new_seed(len, &mut report);

        if let Err(e) = mixer.finalize_into(seed.as_mut_slice()) {
            tracing::error!(error = %e, "Unable to condition new seed");
            report.new_seed.get_or_insert(NewSeedError::from(e));
            credit = Credit::Uncredited;
        }

        report.new_seed_bits = seed.len() * 8;
        report.new_seed_credit = credit;
        tracing::info!(
            "Saving {} bits of {} seed for next boot",
            seed.len() * 8,
            if credit.is_credited() {
                "creditable"
            } else {
                "non-creditable"
            }
        );

        self.save(seed.as_slice(), credit, &mut report);
        report
    }

    /// Consumes one seed file, mixes it in and hands it to the kernel.
    ///
    /// The seed is mixed before injection so a failed injection still
    /// contributes to the next seed.
    fn seed_from_file(
        &mut self,
        kind: SeedKind,
        decision: CreditDecision,
        mixer: &mut SeedMixer,
    ) -> Result<Option<SeededFile>, SeedFileError> {
        let seed = match self.store.consume(kind)? {
            Some(seed) => seed,
            None => return Ok(None),
        };

        mixer.mix_seed(seed.as_slice());
        let credit = decision.resolve(self.options.skip_credit);
        let bits = seed.len() * 8;

        tracing::info!(
            file = %kind,
            "Seeding {} bits {} crediting",
            bits,
            if credit.is_credited() { "and" } else { "without" }
        );
        self.kernel.inject(seed.as_slice(), credit)?;

        Ok(Some(SeededFile { kind, bits, credit }))
    }

    /// Obtains `len` fresh bytes, or the failure marker if none can be had.
    fn new_seed(&mut self, len: usize, report: &mut RunReport) -> (SeedBuf, Credit) {
        let obtained = SeedBuf::zeroed(len)
            .map_err(NewSeedError::from)
            .and_then(|mut seed| {
                let credit = self.entropy.obtain(seed.as_mut_slice())?;
                Ok((seed, credit))
            });

        match obtained {
            Ok(new) => new,
            Err(e) => {
                tracing::error!(error = %e, "Unable to read new seed");
                report.new_seed = Some(e);
                (failure_seed(), Credit::Uncredited)
            }
        }
    }

    /// Writes the new seed under its non-creditable name, then promotes it.
    fn save(&self, seed: &[u8], credit: Credit, report: &mut RunReport) {
        match self.store.store(SeedKind::NonCreditable, seed) {
            Ok(()) => {}
            Err(e @ StoreError::Create { .. }) => {
                tracing::error!(error = %e, "Unable to open seed file for writing");
                report.open_new_seed = Some(e);
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Unable to write seed file");
                report.write_new_seed = Some(e);
                return;
            }
        }

        if !credit.is_credited() {
            report.saved_as = Some(SeedKind::NonCreditable);
            return;
        }

        match self
            .store
            .promote(SeedKind::NonCreditable, SeedKind::Creditable)
        {
            Ok(()) => report.saved_as = Some(SeedKind::Creditable),
            Err(e) => {
                tracing::error!(error = %e, "Unable to make new seed creditable");
                report.saved_as = Some(SeedKind::NonCreditable);
                report.promote_new_seed = Some(e);
            }
        }
    }
}

/// A minimal seed carrying the zero-padded failure marker.
fn failure_seed() -> SeedBuf {
    let mut seed = SeedBuf::minimal();
    let marker_len = FAILURE_MARKER.len().min(seed.len());
    seed.as_mut_slice()[..marker_len].copy_from_slice(&FAILURE_MARKER[..marker_len]);
    seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditioning::{Timestamps, HASH_LEN};
    use crate::kernel::RecordingSeeder;
    use crate::seeder::Step;
    use crate::source::MockEntropy;
    use crate::store::{LockMode, MIN_SEED_LEN};
    use crate::source::EntropyError;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        seed_dir: PathBuf,
        options: SeederOptions,
    }

    fn fixture(pool_bits: &str) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let pool_size_path = tmp.path().join("poolsize");
        fs::write(&pool_size_path, pool_bits).unwrap();
        Fixture {
            seed_dir: tmp.path().join("seedrng"),
            options: SeederOptions {
                skip_credit: false,
                pool_size_path,
            },
            _tmp: tmp,
        }
    }

    fn seeder(
        fx: &Fixture,
        entropy: MockEntropy,
    ) -> Seeder<MockEntropy, RecordingSeeder> {
        let store = SeedStore::open(&fx.seed_dir, LockMode::NoWait).unwrap();
        Seeder::new(store, entropy, RecordingSeeder::new(), fx.options.clone())
    }

    #[test]
    fn test_failure_seed_layout() {
        let seed = failure_seed();
        assert_eq!(seed.len(), HASH_LEN);
        assert_eq!(&seed.as_slice()[..FAILURE_MARKER.len()], FAILURE_MARKER);
        assert!(seed.as_slice()[FAILURE_MARKER.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_both_files_seeded_in_order() {
        let fx = fixture("512");
        fs::create_dir(&fx.seed_dir).unwrap();
        fs::write(fx.seed_dir.join("seed.no-credit"), [1u8; 40]).unwrap();
        fs::write(fx.seed_dir.join("seed.credit"), [2u8; 48]).unwrap();

        let mut seeder = seeder(&fx, MockEntropy::new(Credit::Credited));
        let report = seeder.run(SeedMixer::new(&Timestamps::default()));

        assert!(report.is_success());
        let injections = seeder.kernel().injections();
        assert_eq!(injections.len(), 2);
        assert_eq!(injections[0].seed, vec![1u8; 40]);
        assert_eq!(injections[0].credit_bits, 0);
        assert_eq!(injections[1].seed, vec![2u8; 48]);
        assert_eq!(injections[1].credit_bits, 384);
        assert_eq!(report.seeded.len(), 2);
        assert_eq!(report.credited_bits(), 384);
    }

    #[test]
    fn test_new_seed_sized_from_pool() {
        let fx = fixture("1024\n");
        let mut seeder = seeder(&fx, MockEntropy::new(Credit::Credited));
        let report = seeder.run(SeedMixer::new(&Timestamps::default()));

        assert_eq!(seeder.entropy().requests(), &[128]);
        assert_eq!(report.new_seed_bits, 1024);
        assert_eq!(report.saved_as, Some(SeedKind::Creditable));
        let saved = fs::read(fx.seed_dir.join("seed.credit")).unwrap();
        assert_eq!(saved.len(), 128);
        assert!(!fx.seed_dir.join("seed.no-credit").exists());
    }

    #[test]
    fn test_uncredited_seed_not_promoted() {
        let fx = fixture("256");
        let mut seeder = seeder(&fx, MockEntropy::new(Credit::Uncredited));
        let report = seeder.run(SeedMixer::new(&Timestamps::default()));

        assert!(report.is_success());
        assert_eq!(report.saved_as, Some(SeedKind::NonCreditable));
        assert!(fx.seed_dir.join("seed.no-credit").exists());
        assert!(!fx.seed_dir.join("seed.credit").exists());
    }

    #[test]
    fn test_skip_credit_zeroes_creditable_file() {
        let mut fx = fixture("256");
        fx.options.skip_credit = true;
        fs::create_dir(&fx.seed_dir).unwrap();
        fs::write(fx.seed_dir.join("seed.credit"), [7u8; 64]).unwrap();

        let mut seeder = seeder(&fx, MockEntropy::new(Credit::Credited));
        let report = seeder.run(SeedMixer::new(&Timestamps::default()));

        assert_eq!(seeder.kernel().injections()[0].credit_bits, 0);
        assert_eq!(report.seeded[0].credit, Credit::Uncredited);
        assert_eq!(report.new_seed_credit, Credit::Credited);
    }

    #[test]
    fn test_injection_failure_recorded_and_run_continues() {
        let fx = fixture("256");
        fs::create_dir(&fx.seed_dir).unwrap();
        fs::write(fx.seed_dir.join("seed.credit"), [3u8; 32]).unwrap();

        let store = SeedStore::open(&fx.seed_dir, LockMode::NoWait).unwrap();
        let mut seeder = Seeder::new(
            store,
            MockEntropy::new(Credit::Credited),
            RecordingSeeder::failing(),
            fx.options.clone(),
        );
        let report = seeder.run(SeedMixer::new(&Timestamps::default()));

        assert_eq!(report.failed_steps(), vec![Step::CreditableSeed]);
        assert!(matches!(
            report.creditable_seed,
            Some(SeedFileError::Inject(_))
        ));
        assert!(report.seeded.is_empty());
        assert!(fx.seed_dir.join("seed.credit").exists());
    }

    #[test]
    fn test_entropy_failure_uses_marker() {
        let fx = fixture("4096");
        let mut seeder = seeder(&fx, MockEntropy::failing());
        let report = seeder.run(SeedMixer::new(&Timestamps::default()));

        assert_eq!(report.failed_steps(), vec![Step::NewSeed]);
        assert_eq!(report.exit_code(), 1 << 3);
        assert_eq!(report.new_seed_bits, MIN_SEED_LEN * 8);
        assert_eq!(report.new_seed_credit, Credit::Uncredited);
        assert_eq!(
            fs::read(fx.seed_dir.join("seed.no-credit")).unwrap().len(),
            MIN_SEED_LEN
        );
    }

    /// Links the non-creditable seed name to `/dev/full` once the stored
    /// seeds are consumed, so saving the new seed runs out of space.
    struct FullDeviceEntropy {
        inner: MockEntropy,
        link: PathBuf,
    }

    impl EntropySource for FullDeviceEntropy {
        fn obtain(&mut self, dest: &mut [u8]) -> Result<Credit, EntropyError> {
            std::os::unix::fs::symlink("/dev/full", &self.link).map_err(EntropyError::Urandom)?;
            self.inner.obtain(dest)
        }
    }

    #[test]
    fn test_unopenable_seed_file_reports_open_failure() {
        let fx = fixture("256");
        // A directory in place of the seed file cannot be read or written.
        fs::create_dir_all(fx.seed_dir.join("seed.no-credit").join("x")).unwrap();

        let mut seeder = seeder(&fx, MockEntropy::new(Credit::Credited));
        let report = seeder.run(SeedMixer::new(&Timestamps::default()));

        assert_eq!(
            report.failed_steps(),
            vec![Step::NonCreditableSeed, Step::OpenNewSeed]
        );
        assert_eq!(report.exit_code(), (1 << 1) | (1 << 4));
        assert!(matches!(
            report.open_new_seed,
            Some(StoreError::Create { .. })
        ));
        assert_eq!(report.saved_as, None);
        assert!(!fx.seed_dir.join("seed.credit").exists());
    }

    #[test]
    fn test_full_device_reports_write_failure() {
        if !Path::new("/dev/full").exists() {
            return;
        }
        let fx = fixture("256");
        let store = SeedStore::open(&fx.seed_dir, LockMode::NoWait).unwrap();
        let entropy = FullDeviceEntropy {
            inner: MockEntropy::new(Credit::Credited),
            link: fx.seed_dir.join("seed.no-credit"),
        };
        let mut seeder = Seeder::new(store, entropy, RecordingSeeder::new(), fx.options.clone());
        let report = seeder.run(SeedMixer::new(&Timestamps::default()));

        assert_eq!(report.failed_steps(), vec![Step::WriteNewSeed]);
        assert_eq!(report.exit_code(), 1 << 5);
        assert!(matches!(
            report.write_new_seed,
            Some(StoreError::Write { .. })
        ));
        assert_eq!(report.saved_as, None);
        assert!(!fx.seed_dir.join("seed.credit").exists());
    }

    #[test]
    fn test_failed_promote_keeps_uncredited_seed() {
        let fx = fixture("256");
        // rename(2) cannot replace a non-empty directory.
        fs::create_dir_all(fx.seed_dir.join("seed.credit").join("x")).unwrap();

        let mut seeder = seeder(&fx, MockEntropy::new(Credit::Credited));
        let report = seeder.run(SeedMixer::new(&Timestamps::default()));

        assert_eq!(
            report.failed_steps(),
            vec![Step::CreditableSeed, Step::PromoteNewSeed]
        );
        assert_eq!(report.exit_code(), (1 << 2) | (1 << 6));
        assert!(matches!(
            report.promote_new_seed,
            Some(StoreError::Rename { .. })
        ));
        assert_eq!(report.saved_as, Some(SeedKind::NonCreditable));
        let saved = fs::read(fx.seed_dir.join("seed.no-credit")).unwrap();
        assert_eq!(saved.len(), 32);
        assert!(fx.seed_dir.join("seed.credit").is_dir());
    }
}
