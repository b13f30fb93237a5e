//! SeedRNG CLI
//!
//! Run once early at boot, and ideally again at shutdown, as root.

use clap::Parser;
use seedrng::{
    config::SeedConfig,
    metrics::{MetricsRegistry, MetricsSnapshot},
    seeder::{self, FatalError, RunReport},
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Seed the kernel RNG from stored seeds and save a new one.
#[derive(Debug, Parser)]
#[command(name = "seedrng", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the seed files.
    #[arg(long, value_name = "DIR")]
    seed_dir: Option<PathBuf>,

    /// Inject the stored creditable seed without crediting it.
    #[arg(long)]
    skip_credit: bool,

    /// Fail instead of waiting when another run holds the directory lock.
    #[arg(long)]
    no_wait: bool,

    /// Write run metrics to this Prometheus textfile.
    #[arg(long, value_name = "FILE")]
    metrics_file: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut SeedConfig) {
        if let Some(dir) = &self.seed_dir {
            config.seed_dir = dir.clone();
        }
        if self.skip_credit {
            config.skip_credit = true;
        }
        if self.no_wait {
            config.wait_for_lock = false;
        }
        if let Some(path) = &self.metrics_file {
            config.metrics_file = Some(path.clone());
        }
    }
}

fn main() -> ExitCode {
    seeder::restrict_umask();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::from(e.exit_code());
        }
    };

    info!("SeedRNG v{}", seedrng::VERSION);

    match seeder::seed_system(&config) {
        Ok(report) => {
            if let Some(path) = &config.metrics_file {
                export_metrics(&report, path);
            }
            finish(&report)
        }
        Err(e) => {
            error!(error = %e, "Seeding aborted");
            ExitCode::from(e.exit_code())
        }
    }
}

fn load_config(cli: &Cli) -> Result<SeedConfig, FatalError> {
    let mut config = match &cli.config {
        Some(path) => SeedConfig::from_file(path)?,
        None => SeedConfig::default(),
    };
    config.apply_env();
    cli.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn finish(report: &RunReport) -> ExitCode {
    let code = report.exit_code();
    if code != 0 {
        let failed: Vec<&str> = report.failed_steps().iter().map(|step| step.name()).collect();
        warn!(exit_code = code, failed = ?failed, "Seeding finished with errors");
    }
    ExitCode::from(code)
}

fn export_metrics(report: &RunReport, path: &Path) {
    let written = MetricsRegistry::new().and_then(|registry| {
        registry.update(&MetricsSnapshot::from_report(report));
        registry.write_textfile(path)
    });
    if let Err(e) = written {
        warn!(error = %e, "Failed to export run metrics");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "seedrng",
            "--seed-dir",
            "/run/seeds",
            "--skip-credit",
            "--no-wait",
            "--metrics-file",
            "/tmp/seedrng.prom",
        ]);
        let mut config = SeedConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.seed_dir, PathBuf::from("/run/seeds"));
        assert!(config.skip_credit);
        assert!(!config.wait_for_lock);
        assert_eq!(config.metrics_file, Some(PathBuf::from("/tmp/seedrng.prom")));
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::parse_from(["seedrng"]);
        let mut config = SeedConfig {
            skip_credit: true,
            ..SeedConfig::default()
        };
        cli.apply(&mut config);
        assert!(config.skip_credit);
        assert!(config.wait_for_lock);
    }
}
