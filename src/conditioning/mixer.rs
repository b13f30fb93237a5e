//! Protocol-level entropy mixing.
//!
//! The mixer absorbs material in a fixed order:
//!
//! ```text
//! prefix → realtime → boottime → [len ‖ non-creditable seed] → [len ‖ creditable seed] → len ‖ new seed
//! ```
//!
//! Identical inputs always produce identical digests; the timestamps make
//! sure two runs never do.

use super::blake2s::{Blake2s, ConditioningError, HASH_LEN};
use std::time::Duration;

/// Domain prefix absorbed before anything else.
pub const PROTOCOL_PREFIX: &[u8] = b"SeedRNG v1 Old+New Prefix";

/// Placeholder seed material used when no fresh randomness is available.
pub const FAILURE_MARKER: &[u8] = b"SeedRNG v1 No New Seed Failure";

/// Clock readings taken at the start of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamps {
    /// Wall-clock time since the Unix epoch.
    pub realtime: Duration,
    /// Time since boot, including suspend.
    pub boottime: Duration,
}

fn timespec_bytes(time: Duration) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&(time.as_secs() as i64).to_ne_bytes());
    out[8..].copy_from_slice(&i64::from(time.subsec_nanos()).to_ne_bytes());
    out
}

/// Accumulates all entropy-relevant material of one run.
#[derive(Debug)]
pub struct SeedMixer {
    hash: Blake2s,
}

impl SeedMixer {
    /// Starts a mixer with the protocol prefix and the run's timestamps.
    pub fn new(stamps: &Timestamps) -> Self {
        let mut hash = Blake2s::new();
        hash.update(PROTOCOL_PREFIX);
        hash.update(&timespec_bytes(stamps.realtime));
        hash.update(&timespec_bytes(stamps.boottime));
        Self { hash }
    }

    /// Absorbs a length-prefixed seed.
    pub fn mix_seed(&mut self, seed: &[u8]) {
        self.hash.update(&seed.len().to_ne_bytes());
        self.hash.update(seed);
    }

    /// Absorbs the new seed and overwrites its last [`HASH_LEN`] bytes with
    /// the digest.
    pub fn finalize_into(mut self, seed: &mut [u8]) -> Result<(), ConditioningError> {
        if seed.len() < HASH_LEN {
            return Err(ConditioningError::SeedTooShort(seed.len()));
        }
        self.mix_seed(seed);
        let tail = seed.len() - HASH_LEN;
        self.hash.finalize_into(&mut seed[tail..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamps(secs: u64) -> Timestamps {
        Timestamps {
            realtime: Duration::new(1_700_000_000 + secs, 123),
            boottime: Duration::new(secs, 456),
        }
    }

    fn finish(mixer: SeedMixer, len: usize) -> Vec<u8> {
        let mut seed = vec![0xA5u8; len];
        mixer.finalize_into(&mut seed).unwrap();
        seed
    }

    #[test]
    fn test_same_inputs_same_digest() {
        let mut a = SeedMixer::new(&stamps(5));
        let mut b = SeedMixer::new(&stamps(5));
        a.mix_seed(b"old seed");
        b.mix_seed(b"old seed");
        assert_eq!(finish(a, 64), finish(b, 64));
    }

    #[test]
    fn test_timestamps_change_digest() {
        let a = SeedMixer::new(&stamps(5));
        let b = SeedMixer::new(&stamps(6));
        assert_ne!(finish(a, 32), finish(b, 32));
    }

    #[test]
    fn test_seed_boundaries_are_length_prefixed() {
        let mut a = SeedMixer::new(&stamps(1));
        a.mix_seed(b"ab");
        a.mix_seed(b"c");

        let mut b = SeedMixer::new(&stamps(1));
        b.mix_seed(b"a");
        b.mix_seed(b"bc");

        assert_ne!(finish(a, 32), finish(b, 32));
    }

    #[test]
    fn test_only_tail_is_overwritten() {
        let mixer = SeedMixer::new(&stamps(2));
        let seed = finish(mixer, 100);
        assert!(seed[..100 - HASH_LEN].iter().all(|&b| b == 0xA5));
        assert!(seed[100 - HASH_LEN..].iter().any(|&b| b != 0xA5));
    }

    #[test]
    fn test_digest_matches_manual_hash() {
        let stamps = stamps(3);
        let mut mixer = SeedMixer::new(&stamps);
        mixer.mix_seed(&[1, 2, 3]);
        let seed = finish(mixer, 40);

        let raw = vec![0xA5u8; 40];
        let mut hash = Blake2s::new();
        hash.update(PROTOCOL_PREFIX);
        hash.update(&timespec_bytes(stamps.realtime));
        hash.update(&timespec_bytes(stamps.boottime));
        hash.update(&3usize.to_ne_bytes());
        hash.update(&[1, 2, 3]);
        hash.update(&40usize.to_ne_bytes());
        hash.update(&raw);
        assert_eq!(&seed[8..], &hash.finalize()[..]);
    }

    #[test]
    fn test_short_seed_rejected() {
        let mixer = SeedMixer::new(&stamps(0));
        let mut seed = [0u8; HASH_LEN - 1];
        assert!(matches!(
            mixer.finalize_into(&mut seed),
            Err(ConditioningError::SeedTooShort(31))
        ));
    }
}
