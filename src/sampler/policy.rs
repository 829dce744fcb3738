use std::time::Duration;

/// Decides where the next expiry lands once a firing has been handled.
///
/// `last_deadline` is the deadline that just expired (or the arm time for the
/// first expiry) and `now` the time of the firing. Both are nanoseconds on the
/// timer's timeline.
pub trait RearmPolicy: Send {
    fn next_deadline(&self, last_deadline: u64, now: u64) -> u64;
}

/// Tick-granular re-arm: a fresh delay of whole ticks counted from the tick
/// that contains `now`.
///
/// The previous deadline plays no part, so any lateness of a firing is carried
/// into every later one.
#[derive(Debug, Clone, Copy)]
pub struct CoarsePolicy {
    tick_ns: u64,
    interval_ticks: u64,
}

impl CoarsePolicy {
    pub fn new(interval: Duration, tick: Duration) -> Self {
        let tick_ns = (tick.as_nanos() as u64).max(1);
        let interval_ns = interval.as_nanos() as u64;
        Self {
            tick_ns,
            interval_ticks: interval_ns.div_ceil(tick_ns).max(1),
        }
    }
}

impl RearmPolicy for CoarsePolicy {
    fn next_deadline(&self, _last_deadline: u64, now: u64) -> u64 {
        (now / self.tick_ns + self.interval_ticks) * self.tick_ns
    }
}

/// Re-arm on an absolute grid anchored at the previous deadline, skipping any
/// grid points that already lie in the past.
#[derive(Debug, Clone, Copy)]
pub struct HighResPolicy {
    interval_ns: u64,
}

impl HighResPolicy {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_ns: (interval.as_nanos() as u64).max(1),
        }
    }
}

impl RearmPolicy for HighResPolicy {
    fn next_deadline(&self, last_deadline: u64, now: u64) -> u64 {
        let next = last_deadline + self.interval_ns;
        if next > now {
            return next;
        }
        let missed = (now - last_deadline) / self.interval_ns;
        last_deadline + (missed + 1) * self.interval_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    #[test]
    fn test_coarse_rounds_interval_up_to_ticks() {
        let p = CoarsePolicy::new(Duration::from_millis(10), Duration::from_millis(4));
        // 10ms needs 3 ticks, counted from the tick containing `now`.
        assert_eq!(p.next_deadline(0, 0), 12 * MS);
        assert_eq!(p.next_deadline(0, 13 * MS), 24 * MS);
    }

    #[test]
    fn test_coarse_sub_tick_interval_takes_one_tick() {
        let p = CoarsePolicy::new(Duration::from_micros(1), Duration::from_millis(4));
        assert_eq!(p.next_deadline(0, 5 * MS), 8 * MS);
    }

    #[test]
    fn test_coarse_carries_lateness_forward() {
        let p = CoarsePolicy::new(Duration::from_millis(4), Duration::from_millis(4));
        // Firing 5ms late for the 4ms deadline pushes the next one out a tick.
        assert_eq!(p.next_deadline(4 * MS, 9 * MS), 12 * MS);
    }

    #[test]
    fn test_highres_first_deadline() {
        let p = HighResPolicy::new(Duration::from_millis(1));
        assert_eq!(p.next_deadline(100, 100), 100 + MS);
    }

    #[test]
    fn test_highres_stays_on_grid_when_late() {
        let p = HighResPolicy::new(Duration::from_millis(1));
        // Fired 300us late: the next deadline is still on the original grid.
        assert_eq!(p.next_deadline(MS, MS + 300_000), 2 * MS);
    }

    #[test]
    fn test_highres_skips_missed_deadlines() {
        let p = HighResPolicy::new(Duration::from_millis(1));
        assert_eq!(p.next_deadline(MS, 3 * MS + 500_000), 4 * MS);
        // Landing exactly on a grid point moves to the following one.
        assert_eq!(p.next_deadline(MS, 3 * MS), 4 * MS);
    }
}
