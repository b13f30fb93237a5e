//! Advisory locking of the seed directory.

use crate::eintr::retry_syscall;
use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;

/// How to behave when another process holds the directory lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// Block until the lock is released.
    #[default]
    Wait,
    /// Fail immediately with `WouldBlock`.
    NoWait,
}

/// Takes an exclusive `flock` on `dir`, retrying on EINTR.
///
/// The lock is tied to the open file description and released when the
/// last descriptor referring to it is closed.
pub(crate) fn lock_exclusive(dir: &File, mode: LockMode) -> io::Result<()> {
    let operation = match mode {
        LockMode::Wait => libc::LOCK_EX,
        LockMode::NoWait => libc::LOCK_EX | libc::LOCK_NB,
    };

    // SAFETY: the descriptor is owned by `dir` and stays open for the call.
    retry_syscall(|| unsafe { libc::flock(dir.as_raw_fd(), operation) as isize })?;
    Ok(())
}
