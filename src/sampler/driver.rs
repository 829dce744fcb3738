use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::Error;

use super::buffer::SampleBuffer;
use super::gate::WaitGate;
use super::policy::RearmPolicy;
use super::timer::{Expiry, TimerSource};

enum Rearm {
    Again,
    Stop,
}

/// Per-session firing state, owned by the firing context while armed.
struct Firing {
    timer: Arc<dyn TimerSource>,
    policy: Box<dyn RearmPolicy>,
    buffer: SampleBuffer,
    gate: Arc<WaitGate>,
    cancelled: Arc<AtomicBool>,
    deadline: u64,
    last_fire_timestamp: u64,
    fired_count: usize,
}

impl Firing {
    fn run(mut self) -> Result<SampleBuffer, Error> {
        loop {
            if self.timer.wait_until(self.deadline, &self.cancelled) == Expiry::Cancelled {
                return Ok(self.buffer);
            }
            match self.fire() {
                Ok(Rearm::Again) => {}
                Ok(Rearm::Stop) => return Ok(self.buffer),
                Err(e) => {
                    self.gate.signal_fault();
                    return Err(e);
                }
            }
        }
    }

    /// One expiry: record the gap, then re-arm or finish.
    fn fire(&mut self) -> Result<Rearm, Error> {
        let now = self.timer.now_ns();
        let sample = Duration::from_nanos(now.saturating_sub(self.last_fire_timestamp));
        self.buffer.append(sample)?;
        self.fired_count += 1;

        if self.fired_count < self.buffer.capacity() {
            self.deadline = self.policy.next_deadline(self.deadline, now);
            self.last_fire_timestamp = self.timer.now_ns();
            return Ok(Rearm::Again);
        }

        self.gate.signal_complete();
        Ok(Rearm::Stop)
    }
}

/// A periodic timer that fires once per buffer slot and then stops.
///
/// The buffer travels into the firing context on [`arm`](Self::arm) and comes
/// back from [`teardown`](Self::teardown). Dropping an armed driver cancels it
/// and waits for any in-flight firing.
pub struct PeriodicTimerDriver {
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<SampleBuffer, Error>>>,
}

impl PeriodicTimerDriver {
    /// Starts the firing context; the first expiry is one interval from now
    /// as measured by `policy`.
    pub fn arm(
        timer: Arc<dyn TimerSource>,
        policy: Box<dyn RearmPolicy>,
        buffer: SampleBuffer,
        gate: Arc<WaitGate>,
    ) -> Result<Self, Error> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let now = timer.now_ns();
        let firing = Firing {
            deadline: policy.next_deadline(now, now),
            last_fire_timestamp: now,
            fired_count: 0,
            timer,
            policy,
            buffer,
            gate,
            cancelled: Arc::clone(&cancelled),
        };

        let handle = thread::Builder::new()
            .name("timer-fire".into())
            .spawn(move || firing.run())
            .map_err(|e| {
                Error::ResourceExhausted(format!("cannot start timer firing context: {}", e))
            })?;

        Ok(Self {
            cancelled,
            handle: Some(handle),
        })
    }

    /// Cancels any pending expiry, waits for the firing context to exit and
    /// hands back the buffer.
    pub fn teardown(mut self) -> Result<SampleBuffer, Error> {
        match self.cancel_and_join() {
            Some(Ok(result)) => result,
            Some(Err(_)) => Err(Error::InvariantViolation(
                "timer firing context panicked".into(),
            )),
            None => Err(Error::InvariantViolation(
                "timer driver already released".into(),
            )),
        }
    }

    fn cancel_and_join(&mut self) -> Option<thread::Result<Result<SampleBuffer, Error>>> {
        let handle = self.handle.take()?;
        self.cancelled.store(true, Ordering::Release);
        handle.thread().unpark();
        Some(handle.join())
    }
}

impl Drop for PeriodicTimerDriver {
    fn drop(&mut self) {
        let _ = self.cancel_and_join();
    }
}
