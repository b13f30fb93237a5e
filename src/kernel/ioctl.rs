//! `RNDADDENTROPY` on the random device.

use super::{credit_bits, KernelError, KernelSeeder};
use crate::credit::Credit;
use crate::eintr::retry_syscall;
use crate::store::MAX_SEED_LEN;
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use zeroize::Zeroize;

// _IOW('R', 0x03, int[2]); the direction bits differ on a few architectures.
#[cfg(any(
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "powerpc",
    target_arch = "powerpc64",
    target_arch = "sparc64"
))]
const RNDADDENTROPY: libc::c_ulong = 0x8008_5203;
#[cfg(not(any(
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "powerpc",
    target_arch = "powerpc64",
    target_arch = "sparc64"
)))]
const RNDADDENTROPY: libc::c_ulong = 0x4008_5203;

/// Device the control request is issued against.
const ENTROPY_DEVICE: &str = "/dev/urandom";

/// Matches `struct rand_pool_info` with a fixed-size payload.
#[repr(C)]
struct RandPoolInfo {
    entropy_count: libc::c_int,
    buf_size: libc::c_int,
    buf: [u8; MAX_SEED_LEN],
}

/// Seeds the kernel through the privileged add-entropy ioctl.
#[derive(Debug, Clone)]
pub struct RndAddEntropy {
    device: PathBuf,
}

impl RndAddEntropy {
    /// Issues requests against `device` instead of `/dev/urandom`.
    pub fn with_device(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
        }
    }
}

impl Default for RndAddEntropy {
    fn default() -> Self {
        Self::with_device(ENTROPY_DEVICE)
    }
}

impl KernelSeeder for RndAddEntropy {
    fn inject(&mut self, seed: &[u8], credit: Credit) -> Result<(), KernelError> {
        let bits = credit_bits(seed, credit)?;

        let mut request = RandPoolInfo {
            entropy_count: bits as libc::c_int,
            buf_size: seed.len() as libc::c_int,
            buf: [0u8; MAX_SEED_LEN],
        };
        request.buf[..seed.len()].copy_from_slice(seed);

        let device = File::open(&self.device).map_err(|source| KernelError::Open {
            path: self.device.clone(),
            source,
        })?;

        // SAFETY: `request` is a properly laid out rand_pool_info whose
        // buf_size never exceeds the payload array.
        let result = retry_syscall(|| unsafe {
            libc::ioctl(device.as_raw_fd(), RNDADDENTROPY as _, &request as *const RandPoolInfo) as isize
        });

        request.buf.zeroize();
        result.map_err(KernelError::AddEntropy)?;

        tracing::debug!(len = seed.len(), credit_bits = bits, "Added entropy to kernel pool");
        Ok(())
    }
}
