//! Metrics collection and registry.

use crate::credit::Credit;
use crate::seeder::{RunReport, Step};
use crate::store::SeedKind;
use prometheus::{Encoder, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("unable to write metrics file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// A summary of one run for metrics export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Bits injected from `seed.no-credit`.
    pub non_creditable_seeded_bits: usize,
    /// Bits injected from `seed.credit`.
    pub creditable_seeded_bits: usize,
    /// Bits the kernel was told to credit.
    pub credited_bits: usize,
    /// Size of the seed saved for next boot.
    pub new_seed_bits: usize,
    /// Whether the saved seed is creditable.
    pub new_seed_creditable: bool,
    /// Steps that failed.
    pub failed_steps: Vec<Step>,
}

impl MetricsSnapshot {
    /// Summarizes a run report.
    pub fn from_report(report: &RunReport) -> Self {
        let bits_from = |kind: SeedKind| -> usize {
            report
                .seeded
                .iter()
                .filter(|file| file.kind == kind)
                .map(|file| file.bits)
                .sum()
        };

        Self {
            non_creditable_seeded_bits: bits_from(SeedKind::NonCreditable),
            creditable_seeded_bits: bits_from(SeedKind::Creditable),
            credited_bits: report.credited_bits(),
            new_seed_bits: report.new_seed_bits,
            new_seed_creditable: report.new_seed_credit == Credit::Credited
                && report.saved_as == Some(SeedKind::Creditable),
            failed_steps: report.failed_steps(),
        }
    }

    /// Exit-status style bitmask of the failed steps.
    pub fn failure_mask(&self) -> u8 {
        self.failed_steps
            .iter()
            .fold(0u8, |mask, step| mask | (1 << step.bit()))
    }
}

/// Prometheus metrics registry for seeding runs.
pub struct MetricsRegistry {
    registry: Registry,

    // Stored seeds
    seeded_bits: IntGaugeVec,
    credited_bits: IntGauge,

    // New seed
    new_seed_bits: IntGauge,
    new_seed_creditable: IntGauge,

    // Outcome
    step_failed: IntGaugeVec,
    failure_mask: IntGauge,
    success: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all run metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let seeded_bits = IntGaugeVec::new(
            Opts::new(
                "seedrng_seeded_bits",
                "Bits injected into the kernel from a stored seed file",
            ),
            &["file"],
        )?;
        let credited_bits = IntGauge::new(
            "seedrng_credited_bits",
            "Bits of entropy the kernel was told to credit",
        )?;

        let new_seed_bits = IntGauge::new(
            "seedrng_new_seed_bits",
            "Size of the seed saved for the next boot",
        )?;
        let new_seed_creditable = IntGauge::new(
            "seedrng_new_seed_creditable",
            "Whether the saved seed is creditable (1=creditable, 0=not)",
        )?;

        let step_failed = IntGaugeVec::new(
            Opts::new("seedrng_step_failed", "Whether a run step failed (1=failed)"),
            &["step"],
        )?;
        let failure_mask = IntGauge::new(
            "seedrng_failure_mask",
            "Exit status bitmask of failed steps",
        )?;
        let success = IntGauge::new(
            "seedrng_success",
            "Whether every step succeeded (1=success, 0=failure)",
        )?;

        registry.register(Box::new(seeded_bits.clone()))?;
        registry.register(Box::new(credited_bits.clone()))?;
        registry.register(Box::new(new_seed_bits.clone()))?;
        registry.register(Box::new(new_seed_creditable.clone()))?;
        registry.register(Box::new(step_failed.clone()))?;
        registry.register(Box::new(failure_mask.clone()))?;
        registry.register(Box::new(success.clone()))?;

        Ok(Self {
            registry,
            seeded_bits,
            credited_bits,
            new_seed_bits,
            new_seed_creditable,
            step_failed,
            failure_mask,
            success,
        })
    }

    /// Updates all metrics from a run snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.seeded_bits
            .with_label_values(&[SeedKind::NonCreditable.file_name()])
            .set(snapshot.non_creditable_seeded_bits as i64);
        self.seeded_bits
            .with_label_values(&[SeedKind::Creditable.file_name()])
            .set(snapshot.creditable_seeded_bits as i64);
        self.credited_bits.set(snapshot.credited_bits as i64);

        self.new_seed_bits.set(snapshot.new_seed_bits as i64);
        self.new_seed_creditable
            .set(if snapshot.new_seed_creditable { 1 } else { 0 });

        for step in Step::ALL {
            let failed = snapshot.failed_steps.contains(&step);
            self.step_failed
                .with_label_values(&[step.name()])
                .set(if failed { 1 } else { 0 });
        }
        self.failure_mask.set(i64::from(snapshot.failure_mask()));
        self.success
            .set(if snapshot.failed_steps.is_empty() { 1 } else { 0 });
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Writes the encoded metrics to `path` for a textfile collector.
    ///
    /// The text goes to a hidden sibling first and is renamed into place so
    /// a scraper never sees a partial file.
    pub fn write_textfile(&self, path: &Path) -> Result<(), MetricsError> {
        let text = self.encode()?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "metrics".to_string());
        let tmp = path.with_file_name(format!(".{file_name}.tmp"));

        let written = fs::write(&tmp, text).and_then(|()| fs::rename(&tmp, path));
        if let Err(source) = written {
            let _ = fs::remove_file(&tmp);
            return Err(MetricsError::Write {
                path: path.to_path_buf(),
                source,
            });
        }

        tracing::debug!(path = %path.display(), "Wrote run metrics");
        Ok(())
    }
}
