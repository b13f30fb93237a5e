//! Prometheus metrics for seeding runs.
//!
//! A run is a one-shot boot task, so its summary is written as a file in the
//! Prometheus text format for a node-exporter textfile collector rather than
//! served over HTTP.
//!
//! # Metrics Exposed
//!
//! ## Stored Seeds
//! - `seedrng_seeded_bits{file}` - Bits injected from each stored seed file
//! - `seedrng_credited_bits` - Bits the kernel was told to credit
//!
//! ## New Seed
//! - `seedrng_new_seed_bits` - Size of the seed saved for the next boot
//! - `seedrng_new_seed_creditable` - Whether it was saved as creditable
//!
//! ## Outcome
//! - `seedrng_step_failed{step}` - Per-step failure flag
//! - `seedrng_failure_mask` - Exit status bitmask
//! - `seedrng_success` - 1 if every step succeeded
//!
//! # Example
//!
//! ```no_run
//! use seedrng::metrics::{MetricsRegistry, MetricsSnapshot};
//! use seedrng::seeder::RunReport;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.update(&MetricsSnapshot::from_report(&RunReport::default()));
//! registry
//!     .write_textfile("/var/lib/node_exporter/seedrng.prom".as_ref())
//!     .expect("Failed to write metrics");
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
