//! Clock readings mixed into every run.

use crate::conditioning::Timestamps;
use std::time::Duration;

/// Reads the wall clock and the boot clock.
pub fn now() -> Timestamps {
    Timestamps {
        realtime: read_clock(libc::CLOCK_REALTIME),
        boottime: read_clock(libc::CLOCK_BOOTTIME),
    }
}

fn read_clock(clock: libc::clockid_t) -> Duration {
    // SAFETY: timespec is plain data; all-zero is a valid value.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    // SAFETY: `ts` is a valid, writable timespec.
    if unsafe { libc::clock_gettime(clock, &mut ts) } != 0 {
        tracing::debug!(clock, "clock_gettime failed, mixing zero");
        return Duration::ZERO;
    }
    Duration::new(
        ts.tv_sec.max(0) as u64,
        ts.tv_nsec.clamp(0, 999_999_999) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clocks_advance() {
        let first = now();
        let second = now();
        assert!(first.realtime > Duration::ZERO);
        assert!(second.boottime >= first.boottime);
    }
}
