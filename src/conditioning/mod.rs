//! Entropy mixing via BLAKE2s.
//!
//! Every piece of material a run observes (timestamps, consumed seeds, the
//! freshly obtained seed) is absorbed into one hash whose digest becomes
//! the tail of the next seed. Even a weak entropy source then yields a seed
//! that is bound to everything that came before it.

mod blake2s;
mod mixer;

pub use blake2s::{Blake2s, ConditioningError, BLOCK_LEN, HASH_LEN};
pub use mixer::{SeedMixer, Timestamps, FAILURE_MARKER, PROTOCOL_PREFIX};
