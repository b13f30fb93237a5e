//! Process privilege and file creation mask.

/// Returns true when running with a real user id of root.
pub fn is_privileged() -> bool {
    // SAFETY: getuid has no preconditions and cannot fail.
    unsafe { libc::getuid() == 0 }
}

/// Makes every file and directory created afterwards owner-only.
pub fn restrict_umask() {
    // SAFETY: umask has no preconditions and cannot fail.
    unsafe {
        libc::umask(0o077);
    }
}
