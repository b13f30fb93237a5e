//! Retry helpers for calls that may be interrupted by signals.

use std::io::{self, Read};

/// Reads until `buf` is full or the reader hits end of file.
///
/// Interrupted reads are resumed. Returns the number of bytes read, which is
/// less than `buf.len()` only at end of file.
pub(crate) fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// Runs a raw system call until it stops failing with EINTR.
///
/// `call` returns the raw result; a negative value means failure with the
/// reason in `errno`.
pub(crate) fn retry_syscall<F>(mut call: F) -> io::Result<usize>
where
    F: FnMut() -> isize,
{
    loop {
        let ret = call();
        if ret >= 0 {
            return Ok(ret as usize);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
