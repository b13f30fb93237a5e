//! The kernel randomness fallback chain.

use super::{EntropyError, EntropySource, LinuxRandom};
use crate::credit::Credit;
use crate::eintr::read_full;
use std::io::{self, Read};

/// Quality request passed to `getrandom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetRandomMode {
    /// `GRND_NONBLOCK`: fail with EAGAIN unless the pool is initialized.
    NonBlocking,
    /// `GRND_INSECURE`: never block, quality not guaranteed.
    Insecure,
}

/// Raw kernel randomness interfaces.
///
/// Each method performs one operation and may return short reads or
/// `Interrupted`; retrying is the caller's job.
pub trait RandomBackend {
    /// Handle for reading the non-blocking random device.
    type Device: Read;

    /// One `getrandom` call into `buf`.
    fn getrandom(&mut self, buf: &mut [u8], mode: GetRandomMode) -> io::Result<usize>;

    /// Opens the blocking random device and checks, without blocking,
    /// whether it has data ready.
    fn random_ready(&mut self) -> io::Result<bool>;

    /// Opens the non-blocking random device.
    fn open_urandom(&mut self) -> io::Result<Self::Device>;
}

/// Entropy from the running kernel, best source first.
///
/// 1. `getrandom(GRND_NONBLOCK)`: creditable.
/// 2. If `getrandom` does not exist, poll the blocking device for readiness
///    and use that as the credit verdict, reading the bytes from the
///    non-blocking device.
/// 3. Otherwise `getrandom(GRND_INSECURE)`: not creditable.
/// 4. Finally the non-blocking device: not creditable.
#[derive(Debug, Default)]
pub struct SystemEntropy<B = LinuxRandom> {
    backend: B,
}

impl SystemEntropy<LinuxRandom> {
    /// Uses the running kernel's interfaces.
    pub fn linux(backend: LinuxRandom) -> Self {
        Self { backend }
    }
}

impl<B: RandomBackend> SystemEntropy<B> {
    /// Uses a custom backend.
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: RandomBackend> EntropySource for SystemEntropy<B> {
    fn obtain(&mut self, dest: &mut [u8]) -> Result<Credit, EntropyError> {
        let credit = match getrandom_full(&mut self.backend, dest, GetRandomMode::NonBlocking) {
            Ok(()) => return Ok(Credit::Credited),
            Err(e) if e.raw_os_error() == Some(libc::ENOSYS) => {
                let ready = self
                    .backend
                    .random_ready()
                    .map_err(EntropyError::RandomDevice)?;
                tracing::debug!(ready, "getrandom unavailable, probed blocking random device");
                Credit::from_creditable(ready)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Kernel pool not ready, trying insecure getrandom");
                match getrandom_full(&mut self.backend, dest, GetRandomMode::Insecure) {
                    Ok(()) => return Ok(Credit::Uncredited),
                    Err(e) => {
                        tracing::debug!(error = %e, "Insecure getrandom failed");
                    }
                }
                Credit::Uncredited
            }
        };

        let mut device = self.backend.open_urandom().map_err(EntropyError::Urandom)?;
        let got = read_full(&mut device, dest).map_err(EntropyError::Urandom)?;
        if got != dest.len() {
            return Err(EntropyError::ShortRead {
                got,
                want: dest.len(),
            });
        }
        Ok(credit)
    }
}

/// Fills `buf` with repeated `getrandom` calls, resuming after interrupts.
fn getrandom_full<B: RandomBackend>(
    backend: &mut B,
    buf: &mut [u8],
    mode: GetRandomMode,
) -> io::Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match backend.getrandom(&mut buf[filled..], mode) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "getrandom returned no data",
                ));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
