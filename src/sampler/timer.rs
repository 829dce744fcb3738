use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Result of waiting for one armed expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Expired,
    Cancelled,
}

/// The external timer facility the firing context runs on.
///
/// Every call to `wait_until` arms one one-shot expiry at an absolute
/// deadline on the `now_ns` timeline.
pub trait TimerSource: Send + Sync {
    fn now_ns(&self) -> u64;

    /// Blocks until `deadline_ns` has passed or `cancelled` is raised.
    /// Raising `cancelled` is followed by an unpark of the waiting thread.
    fn wait_until(&self, deadline_ns: u64, cancelled: &AtomicBool) -> Expiry;
}

/// Host timer backed by CLOCK_MONOTONIC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimer;

impl TimerSource for SystemTimer {
    fn now_ns(&self) -> u64 {
        clock_gettime_ns()
    }

    fn wait_until(&self, deadline_ns: u64, cancelled: &AtomicBool) -> Expiry {
        loop {
            if cancelled.load(Ordering::Acquire) {
                return Expiry::Cancelled;
            }
            let now = clock_gettime_ns();
            if now >= deadline_ns {
                return Expiry::Expired;
            }
            thread::park_timeout(Duration::from_nanos(deadline_ns - now));
        }
    }
}

fn clock_gettime_ns() -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
    }
    (ts.tv_sec as u64)
        .wrapping_mul(1_000_000_000)
        .wrapping_add(ts.tv_nsec as u64)
}
