//! Seed file identities and bounded seed buffers.

use crate::conditioning::HASH_LEN;
use thiserror::Error;
use zeroize::Zeroize;

/// Largest seed accepted from disk or handed to the kernel.
pub const MAX_SEED_LEN: usize = 512;

/// Smallest seed ever written (one full digest).
pub const MIN_SEED_LEN: usize = HASH_LEN;

/// A length outside `[0, MAX_SEED_LEN]`.
#[derive(Debug, Clone, Error)]
#[error("seed length {len} exceeds the {max}-byte maximum", max = MAX_SEED_LEN)]
pub struct SeedLenError {
    /// The rejected length.
    pub len: usize,
}

/// The two seed files kept in the seed directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedKind {
    /// `seed.credit`: written only when the kernel pool was initialized.
    Creditable,
    /// `seed.no-credit`: always written first.
    NonCreditable,
}

impl SeedKind {
    /// File name inside the seed directory.
    pub fn file_name(self) -> &'static str {
        match self {
            SeedKind::Creditable => "seed.credit",
            SeedKind::NonCreditable => "seed.no-credit",
        }
    }
}

impl std::fmt::Display for SeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Fixed-capacity seed buffer.
///
/// Holds at most [`MAX_SEED_LEN`] bytes. Oversized input is rejected rather
/// than truncated, and the contents are wiped when the buffer is dropped.
#[derive(Clone)]
pub struct SeedBuf {
    bytes: [u8; MAX_SEED_LEN],
    len: usize,
}

impl SeedBuf {
    /// Creates a zero-filled buffer of `len` bytes.
    pub fn zeroed(len: usize) -> Result<Self, SeedLenError> {
        if len > MAX_SEED_LEN {
            return Err(SeedLenError { len });
        }
        Ok(Self {
            bytes: [0u8; MAX_SEED_LEN],
            len,
        })
    }

    /// Creates a zero-filled buffer of [`MIN_SEED_LEN`] bytes.
    pub fn minimal() -> Self {
        Self {
            bytes: [0u8; MAX_SEED_LEN],
            len: MIN_SEED_LEN,
        }
    }

    /// Copies `data` into a new buffer.
    pub fn from_slice(data: &[u8]) -> Result<Self, SeedLenError> {
        let mut buf = Self::zeroed(data.len())?;
        buf.as_mut_slice().copy_from_slice(data);
        Ok(buf)
    }

    /// Returns the seed bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Returns the seed bytes mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.len]
    }

    /// Returns the seed length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true for a zero-length seed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Shortens the seed to `len` bytes, wiping the discarded tail.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.bytes[len..self.len].zeroize();
            self.len = len;
        }
    }
}

impl Drop for SeedBuf {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SeedBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedBuf")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(SeedKind::Creditable.file_name(), "seed.credit");
        assert_eq!(SeedKind::NonCreditable.file_name(), "seed.no-credit");
    }

    #[test]
    fn test_oversized_seed_rejected() {
        let data = vec![0xAAu8; MAX_SEED_LEN + 1];
        let err = SeedBuf::from_slice(&data).unwrap_err();
        assert_eq!(err.len, MAX_SEED_LEN + 1);
        assert!(SeedBuf::zeroed(MAX_SEED_LEN + 1).is_err());
    }

    #[test]
    fn test_from_slice_keeps_contents() {
        let buf = SeedBuf::from_slice(&[1, 2, 3]).unwrap();
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
        assert_eq!(buf.len(), 3);
        assert!(!buf.is_empty());
    }

    #[test]
    fn test_truncate_only_shrinks() {
        let mut buf = SeedBuf::from_slice(&[1, 2, 3, 4]).unwrap();
        buf.truncate(8);
        assert_eq!(buf.len(), 4);
        buf.truncate(2);
        assert_eq!(buf.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_debug_hides_contents() {
        let buf = SeedBuf::from_slice(&[0x42; 32]).unwrap();
        let printed = format!("{:?}", buf);
        assert!(printed.contains("len: 32"));
        assert!(!printed.contains("66"));
    }
}
