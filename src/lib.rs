//! SeedRNG Library
//!
//! Seeds the Linux kernel random number generator early at boot from seed
//! files saved by the previous boot, and leaves a fresh seed behind for the
//! next one.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! store (consume) → conditioning → kernel (inject)
//!                        ↑
//! source (new seed) → conditioning → store (save)
//! ```
//!
//! # Design Principles
//!
//! - **Read once**: A seed file is deleted, durably, before its bytes are used
//! - **All or nothing credit**: A seed is credited in full or not at all
//! - **Partial seeding beats none**: Step failures are recorded, never fatal
//! - **Bound to the run**: Every new seed ends in a BLAKE2s digest of all
//!   material seen this run, including the clocks
//!
//! # Example
//!
//! ```no_run
//! use seedrng::{
//!     conditioning::{SeedMixer, Timestamps},
//!     credit::Credit,
//!     kernel::RecordingSeeder,
//!     seeder::{Seeder, SeederOptions},
//!     source::MockEntropy,
//!     store::{LockMode, SeedStore},
//! };
//!
//! let store = SeedStore::open("/tmp/seedrng", LockMode::Wait).unwrap();
//! let mut seeder = Seeder::new(
//!     store,
//!     MockEntropy::new(Credit::Credited),
//!     RecordingSeeder::new(),
//!     SeederOptions::default(),
//! );
//!
//! let report = seeder.run(SeedMixer::new(&Timestamps::default()));
//! std::process::exit(i32::from(report.exit_code()));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod conditioning;
pub mod config;
pub mod credit;
mod eintr;
pub mod kernel;
pub mod metrics;
pub mod seeder;
pub mod source;
pub mod store;

// Re-export commonly used types at crate root
pub use conditioning::{Blake2s, SeedMixer, Timestamps};
pub use config::SeedConfig;
pub use credit::{Credit, CreditDecision};
pub use kernel::{KernelSeeder, RecordingSeeder, RndAddEntropy};
pub use seeder::{seed_system, FatalError, RunReport, Seeder, SeederOptions};
pub use source::{EntropySource, MockEntropy, SystemEntropy};
pub use store::{LockMode, SeedBuf, SeedKind, SeedStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
