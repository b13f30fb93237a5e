//! Entropy crediting decisions.
//!
//! A seed is either credited (the kernel counts every bit as entropy) or
//! not credited at all; partial credit is never given. Consumed seed files
//! carry a [`CreditDecision`] that is resolved once into a [`Credit`], and
//! that single value drives both the log output and the kernel injection.

/// Resolved crediting for one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Credit {
    /// The kernel credits `len * 8` bits.
    Credited,
    /// The buffer is mixed in without increasing the entropy estimate.
    #[default]
    Uncredited,
}

impl Credit {
    /// Builds a credit from a quality verdict.
    pub fn from_creditable(creditable: bool) -> Self {
        if creditable {
            Credit::Credited
        } else {
            Credit::Uncredited
        }
    }

    /// Returns true if the buffer should be credited.
    #[inline]
    pub fn is_credited(self) -> bool {
        matches!(self, Credit::Credited)
    }

    /// Number of entropy bits to credit for a buffer of `len` bytes.
    #[inline]
    pub fn bits_for(self, len: usize) -> usize {
        match self {
            Credit::Credited => len * 8,
            Credit::Uncredited => 0,
        }
    }
}

/// Crediting policy attached to a consumed seed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditDecision {
    /// Always credited.
    Credited,
    /// Never credited.
    Uncredited,
    /// Credited unless the operator forces zero-credit mode.
    CreditedUnlessSkipped,
}

impl CreditDecision {
    /// Resolves the policy against the skip-credit switch.
    pub fn resolve(self, skip_credit: bool) -> Credit {
        match self {
            CreditDecision::Credited => Credit::Credited,
            CreditDecision::Uncredited => Credit::Uncredited,
            CreditDecision::CreditedUnlessSkipped if skip_credit => Credit::Uncredited,
            CreditDecision::CreditedUnlessSkipped => Credit::Credited,
        }
    }
}
