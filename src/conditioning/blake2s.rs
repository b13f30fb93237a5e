//! Streaming BLAKE2s hash.
//!
//! A self-contained implementation of the unkeyed BLAKE2s construction
//! (RFC 7693), bit-for-bit identical to the reference BLAKE2s-256 when the
//! output length is 32 bytes. Seed files written by other implementations
//! of the boot seeding protocol stay compatible with the ones written here.

use thiserror::Error;

/// Compression block length in bytes.
pub const BLOCK_LEN: usize = 64;

/// Maximum (and default) digest length in bytes.
pub const HASH_LEN: usize = 32;

const IV: [u32; 8] = [
    0x6A09_E667,
    0xBB67_AE85,
    0x3C6E_F372,
    0xA54F_F53A,
    0x510E_527F,
    0x9B05_688C,
    0x1F83_D9AB,
    0x5BE0_CD19,
];

const SIGMA: [[usize; 16]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
];

/// Errors from hash construction.
#[derive(Debug, Clone, Error)]
pub enum ConditioningError {
    #[error("invalid digest length {0} (must be 1-{max} bytes)", max = HASH_LEN)]
    InvalidOutputLength(usize),
    #[error("seed of {0} bytes cannot hold a {max}-byte digest", max = HASH_LEN)]
    SeedTooShort(usize),
    #[error("digest buffer is {got} bytes, hasher produces {want}")]
    DigestBufferLength { got: usize, want: usize },
}

/// Incremental BLAKE2s state.
///
/// Updates may be chunked arbitrarily; the digest only depends on the
/// concatenation of all inputs. `finalize` consumes the state, so a digest
/// can be taken exactly once.
#[derive(Clone)]
pub struct Blake2s {
    h: [u32; 8],
    /// Byte counter (t0 in the low half, t1 in the high half).
    t: u64,
    buf: [u8; BLOCK_LEN],
    buflen: usize,
    outlen: usize,
}

impl Blake2s {
    /// Creates a hasher producing a full 32-byte digest.
    pub fn new() -> Self {
        Self::init(HASH_LEN)
    }

    /// Creates a hasher producing `outlen` bytes of output.
    pub fn with_output_len(outlen: usize) -> Result<Self, ConditioningError> {
        if outlen == 0 || outlen > HASH_LEN {
            return Err(ConditioningError::InvalidOutputLength(outlen));
        }
        Ok(Self::init(outlen))
    }

    fn init(outlen: usize) -> Self {
        let mut h = IV;
        // Parameter block: digest length, no key, fanout 1, depth 1.
        h[0] ^= 0x0101_0000 | outlen as u32;
        Self {
            h,
            t: 0,
            buf: [0u8; BLOCK_LEN],
            buflen: 0,
            outlen,
        }
    }

    /// Returns the configured digest length.
    #[inline]
    pub fn output_len(&self) -> usize {
        self.outlen
    }

    /// Absorbs `input` into the state.
    pub fn update(&mut self, mut input: &[u8]) {
        if input.is_empty() {
            return;
        }

        // The last block is always held back in `buf` so that finalization
        // can compress it with the last-block flag set.
        let fill = BLOCK_LEN - self.buflen;
        if input.len() > fill {
            self.buf[self.buflen..].copy_from_slice(&input[..fill]);
            let block = self.buf;
            self.compress(&block, BLOCK_LEN as u32, false);
            self.buflen = 0;
            input = &input[fill..];
        }
        while input.len() > BLOCK_LEN {
            let (block, rest) = input.split_at(BLOCK_LEN);
            let mut full = [0u8; BLOCK_LEN];
            full.copy_from_slice(block);
            self.compress(&full, BLOCK_LEN as u32, false);
            input = rest;
        }
        self.buf[self.buflen..self.buflen + input.len()].copy_from_slice(input);
        self.buflen += input.len();
    }

    /// Writes the digest into `out`, which must be exactly `output_len()` bytes.
    pub fn finalize_into(self, out: &mut [u8]) -> Result<(), ConditioningError> {
        if out.len() != self.output_len() {
            return Err(ConditioningError::DigestBufferLength {
                got: out.len(),
                want: self.output_len(),
            });
        }
        let outlen = self.outlen;
        out.copy_from_slice(&self.digest()[..outlen]);
        Ok(())
    }

    /// Consumes the state and returns the digest.
    pub fn finalize(self) -> Vec<u8> {
        let outlen = self.outlen;
        self.digest()[..outlen].to_vec()
    }

    fn digest(mut self) -> [u8; HASH_LEN] {
        self.buf[self.buflen..].fill(0);
        let block = self.buf;
        // The final increment is the number of real bytes in this block.
        self.compress(&block, self.buflen as u32, true);

        let mut full = [0u8; HASH_LEN];
        for (chunk, word) in full.chunks_exact_mut(4).zip(self.h.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        full
    }

    fn compress(&mut self, block: &[u8; BLOCK_LEN], inc: u32, last: bool) {
        self.t = self.t.wrapping_add(u64::from(inc));

        let mut m = [0u32; 16];
        for (word, chunk) in m.iter_mut().zip(block.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        let mut v = [0u32; 16];
        v[..8].copy_from_slice(&self.h);
        v[8..12].copy_from_slice(&IV[..4]);
        v[12] = IV[4] ^ self.t as u32;
        v[13] = IV[5] ^ (self.t >> 32) as u32;
        v[14] = IV[6] ^ if last { u32::MAX } else { 0 };
        v[15] = IV[7];

        for s in SIGMA.iter() {
            g(&mut v, 0, 4, 8, 12, m[s[0]], m[s[1]]);
            g(&mut v, 1, 5, 9, 13, m[s[2]], m[s[3]]);
            g(&mut v, 2, 6, 10, 14, m[s[4]], m[s[5]]);
            g(&mut v, 3, 7, 11, 15, m[s[6]], m[s[7]]);
            g(&mut v, 0, 5, 10, 15, m[s[8]], m[s[9]]);
            g(&mut v, 1, 6, 11, 12, m[s[10]], m[s[11]]);
            g(&mut v, 2, 7, 8, 13, m[s[12]], m[s[13]]);
            g(&mut v, 3, 4, 9, 14, m[s[14]], m[s[15]]);
        }

        for i in 0..8 {
            self.h[i] ^= v[i] ^ v[i + 8];
        }
    }
}

impl Default for Blake2s {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Blake2s {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blake2s")
            .field("outlen", &self.outlen)
            .field("bytes_buffered", &self.buflen)
            .finish_non_exhaustive()
    }
}

#[inline(always)]
fn g(v: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize, x: u32, y: u32) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(12);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(8);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(7);
}
