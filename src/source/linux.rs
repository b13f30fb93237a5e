//! Linux randomness system calls and devices.

use super::system::{GetRandomMode, RandomBackend};
use crate::eintr::retry_syscall;
use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;

const GRND_NONBLOCK: libc::c_uint = 0x0001;
const GRND_INSECURE: libc::c_uint = 0x0004;

/// Default blocking random device, probed for readiness only.
pub const RANDOM_DEVICE: &str = "/dev/random";

/// Default non-blocking random device.
pub const URANDOM_DEVICE: &str = "/dev/urandom";

/// The running kernel's randomness interfaces.
#[derive(Debug, Clone)]
pub struct LinuxRandom {
    random_device: PathBuf,
    urandom_device: PathBuf,
}

impl LinuxRandom {
    /// Uses custom device paths.
    pub fn with_devices(random_device: impl Into<PathBuf>, urandom_device: impl Into<PathBuf>) -> Self {
        Self {
            random_device: random_device.into(),
            urandom_device: urandom_device.into(),
        }
    }
}

impl Default for LinuxRandom {
    fn default() -> Self {
        Self::with_devices(RANDOM_DEVICE, URANDOM_DEVICE)
    }
}

impl RandomBackend for LinuxRandom {
    type Device = File;

    fn getrandom(&mut self, buf: &mut [u8], mode: GetRandomMode) -> io::Result<usize> {
        let flags = match mode {
            GetRandomMode::NonBlocking => GRND_NONBLOCK,
            GetRandomMode::Insecure => GRND_INSECURE,
        };
        // Issued as a raw system call so that a kernel without getrandom
        // reports ENOSYS instead of a libc emulation kicking in.
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
        let ret = unsafe {
            libc::syscall(
                libc::SYS_getrandom,
                buf.as_mut_ptr(),
                buf.len(),
                flags,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ret as usize)
    }

    fn random_ready(&mut self) -> io::Result<bool> {
        let device = File::open(&self.random_device)?;
        let mut pollfd = libc::pollfd {
            fd: device.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        // Zero timeout: a readiness probe, never a wait.
        // SAFETY: `pollfd` is a single valid entry and `device` outlives the call.
        let ready = retry_syscall(|| unsafe { libc::poll(&mut pollfd, 1, 0) as isize });
        Ok(matches!(ready, Ok(1)))
    }

    fn open_urandom(&mut self) -> io::Result<File> {
        File::open(&self.urandom_device)
    }
}
