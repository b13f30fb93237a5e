//! Seed file persistence.
//!
//! Seeds live in a single directory that is created owner-only and locked
//! exclusively for the lifetime of a run. Each seed file is consumed at most
//! once: it is read, deleted, and the deletion is synced before the bytes
//! are trusted. New seeds are always written as the non-creditable file and
//! renamed over the creditable one only when they deserve credit.

mod directory;
#[allow(unsafe_code)]
mod lock;
mod seed_file;

pub use directory::{SeedStore, StoreError};
pub use lock::LockMode;
pub use seed_file::{SeedBuf, SeedKind, SeedLenError, MAX_SEED_LEN, MIN_SEED_LEN};
