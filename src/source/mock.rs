//! Deterministic entropy source for testing.

use super::{EntropyError, EntropySource};
use crate::credit::Credit;
use std::io;

/// Mock entropy source that produces a counter pattern or fails on demand.
///
/// NOT random. Only for exercising the seeding pipeline.
#[derive(Debug, Clone)]
pub struct MockEntropy {
    credit: Option<Credit>,
    sequence: u8,
    requests: Vec<usize>,
}

impl MockEntropy {
    /// A source that always succeeds with the given credit.
    pub fn new(credit: Credit) -> Self {
        Self {
            credit: Some(credit),
            sequence: 0,
            requests: Vec::new(),
        }
    }

    /// A source on which every fallback fails.
    pub fn failing() -> Self {
        Self {
            credit: None,
            sequence: 0,
            requests: Vec::new(),
        }
    }

    /// Lengths of all requests seen so far.
    pub fn requests(&self) -> &[usize] {
        &self.requests
    }
}

impl EntropySource for MockEntropy {
    fn obtain(&mut self, dest: &mut [u8]) -> Result<Credit, EntropyError> {
        self.requests.push(dest.len());
        let credit = self.credit.ok_or_else(|| {
            EntropyError::Urandom(io::Error::new(
                io::ErrorKind::Other,
                "mock entropy source failure",
            ))
        })?;

        for byte in dest.iter_mut() {
            *byte = self.sequence;
            self.sequence = self.sequence.wrapping_add(1);
        }
        Ok(credit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fills_whole_buffer() {
        let mut source = MockEntropy::new(Credit::Credited);
        let mut buf = [0xFFu8; 4];
        assert_eq!(source.obtain(&mut buf).unwrap(), Credit::Credited);
        assert_eq!(buf, [0, 1, 2, 3]);
        assert_eq!(source.requests(), &[4]);
    }

    #[test]
    fn test_failing_mock() {
        let mut source = MockEntropy::failing();
        let mut buf = [0u8; 4];
        assert!(source.obtain(&mut buf).is_err());
        assert_eq!(source.requests(), &[4]);
    }
}
