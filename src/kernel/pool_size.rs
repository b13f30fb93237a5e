//! Sizing the next seed from the kernel's entropy pool.

use crate::store::{MAX_SEED_LEN, MIN_SEED_LEN};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Kernel pseudo-file reporting the pool size in bits.
pub const POOL_SIZE_PATH: &str = "/proc/sys/kernel/random/poolsize";

/// Only this many leading bytes of the pseudo-file are considered.
const MAX_POOL_SIZE_DIGITS: u64 = 10;

/// Parses the leading decimal digits of `text`, skipping leading whitespace.
///
/// Returns `None` when there are no digits.
pub fn parse_pool_bits(text: &str) -> Option<u64> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse().unwrap_or(u64::MAX))
}

/// Converts a pool size in bits to a seed length, rounding up and clamping
/// to `[MIN_SEED_LEN, MAX_SEED_LEN]`.
pub fn seed_len_for_pool_bits(bits: u64) -> usize {
    bits.div_ceil(8)
        .clamp(MIN_SEED_LEN as u64, MAX_SEED_LEN as u64) as usize
}

/// Determines the new seed length from the pool-size pseudo-file.
///
/// Falls back to [`MIN_SEED_LEN`] when the size cannot be determined.
pub fn optimal_seed_len(path: &Path) -> usize {
    let mut text = String::new();
    let read = File::open(path)
        .and_then(|file| file.take(MAX_POOL_SIZE_DIGITS).read_to_string(&mut text));

    if let Err(e) = read {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "Unable to determine pool size, falling back to {} bits",
            MIN_SEED_LEN * 8
        );
        return MIN_SEED_LEN;
    }

    match parse_pool_bits(&text) {
        Some(bits) => {
            let len = seed_len_for_pool_bits(bits);
            tracing::debug!(pool_bits = bits, seed_len = len, "Determined seed length");
            len
        }
        None => {
            tracing::warn!(
                path = %path.display(),
                "Unparseable pool size, falling back to {} bits",
                MIN_SEED_LEN * 8
            );
            MIN_SEED_LEN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;

    #[test]
    fn test_parse_pool_bits() {
        assert_eq!(parse_pool_bits("4096\n"), Some(4096));
        assert_eq!(parse_pool_bits("  256"), Some(256));
        assert_eq!(parse_pool_bits("123abc"), Some(123));
        assert_eq!(parse_pool_bits("abc"), None);
        assert_eq!(parse_pool_bits(""), None);
    }

    #[test]
    fn test_typical_pool_sizes() {
        assert_eq!(seed_len_for_pool_bits(256), 32);
        assert_eq!(seed_len_for_pool_bits(4096), 512);
        assert_eq!(seed_len_for_pool_bits(1000), 125);
        assert_eq!(seed_len_for_pool_bits(1001), 126);
    }

    #[test]
    fn test_edge_pool_sizes_clamped() {
        assert_eq!(seed_len_for_pool_bits(0), MIN_SEED_LEN);
        assert_eq!(seed_len_for_pool_bits(u64::MAX), MAX_SEED_LEN);
    }

    #[test]
    fn test_pool_size_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("poolsize");

        fs::write(&path, "2048\n").unwrap();
        assert_eq!(optimal_seed_len(&path), 256);

        fs::write(&path, "99999999999999999999").unwrap();
        assert_eq!(optimal_seed_len(&path), MAX_SEED_LEN);

        fs::write(&path, "garbage").unwrap();
        assert_eq!(optimal_seed_len(&path), MIN_SEED_LEN);
    }

    #[test]
    fn test_missing_pool_size_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(optimal_seed_len(&tmp.path().join("absent")), MIN_SEED_LEN);
    }

    proptest! {
        #[test]
        fn prop_seed_len_always_clamped(bits in any::<u64>()) {
            let len = seed_len_for_pool_bits(bits);
            prop_assert!((MIN_SEED_LEN..=MAX_SEED_LEN).contains(&len));
        }

        #[test]
        fn prop_any_file_contents_give_valid_length(text in ".{0,16}") {
            let len = parse_pool_bits(&text).map_or(MIN_SEED_LEN, seed_len_for_pool_bits);
            prop_assert!((MIN_SEED_LEN..=MAX_SEED_LEN).contains(&len));
        }
    }
}
