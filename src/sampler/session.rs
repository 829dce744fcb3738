use std::sync::Arc;
use std::time::Duration;

use crate::config::SamplerConfig;
use crate::error::Error;

use super::buffer::SampleBuffer;
use super::driver::PeriodicTimerDriver;
use super::gate::{InterruptSource, WaitGate, WaitOutcome};
use super::timer::TimerSource;
use super::SamplingRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Validated,
    Rejected,
    Armed,
    Waiting,
    Completed,
    Interrupted,
    Faulted,
    Closed,
}

impl SessionState {
    fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Rejected
                | SessionState::Completed
                | SessionState::Interrupted
                | SessionState::Faulted
        )
    }
}

/// One measurement run: validate, arm, suspend, collect, release.
pub struct SamplingSession<'a> {
    request: SamplingRequest,
    timer: Arc<dyn TimerSource>,
    interrupt: &'a dyn InterruptSource,
    tick: Duration,
    wait_slice: Duration,
    state: SessionState,
    terminal: Option<SessionState>,
}

impl<'a> SamplingSession<'a> {
    pub fn new(
        request: SamplingRequest,
        timer: Arc<dyn TimerSource>,
        interrupt: &'a dyn InterruptSource,
        config: &SamplerConfig,
    ) -> Self {
        Self {
            request,
            timer,
            interrupt,
            tick: config.tick(),
            wait_slice: config.wait_slice(),
            state: SessionState::Created,
            terminal: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The state the session ended in before it was closed.
    pub fn terminal_state(&self) -> Option<SessionState> {
        self.terminal
    }

    fn transition(&mut self, next: SessionState) {
        log::debug!("session state {:?} -> {:?}", self.state, next);
        if next.is_terminal() {
            self.terminal = Some(next);
        }
        self.state = next;
    }

    fn close<T>(&mut self, terminal: SessionState, result: Result<T, Error>) -> Result<T, Error> {
        self.transition(terminal);
        self.transition(SessionState::Closed);
        result
    }

    pub fn run(&mut self) -> Result<Vec<Duration>, Error> {
        if let Err(e) = self.request.validate() {
            log::warn!("rejected sampling request: {}", e);
            return self.close(SessionState::Rejected, Err(e));
        }
        self.transition(SessionState::Validated);

        let buffer = match SampleBuffer::new(self.request.count as usize) {
            Ok(buffer) => buffer,
            Err(e) => return self.close(SessionState::Faulted, Err(e)),
        };

        // Wait intent is registered before arming so a run that completes
        // before we suspend still leaves a wakeup behind.
        let gate = Arc::new(WaitGate::new());
        gate.prepare_wait();

        let policy = self.request.mode.policy(self.request.interval, self.tick);
        let driver = match PeriodicTimerDriver::arm(
            Arc::clone(&self.timer),
            policy,
            buffer,
            Arc::clone(&gate),
        ) {
            Ok(driver) => driver,
            Err(e) => return self.close(SessionState::Faulted, Err(e)),
        };
        self.transition(SessionState::Armed);

        self.transition(SessionState::Waiting);
        let outcome = gate.wait(self.interrupt, self.wait_slice);
        log::debug!(
            "resumed: {:?} (completed flag {})",
            outcome,
            gate.is_completed()
        );

        match (outcome, driver.teardown()) {
            (_, Err(e)) => {
                log::error!("timer driver fault: {}", e);
                self.close(SessionState::Faulted, Err(e))
            }
            (WaitOutcome::Interrupted, Ok(_)) => {
                self.close(SessionState::Interrupted, Err(Error::Interrupted))
            }
            (WaitOutcome::Completed, Ok(buffer)) if buffer.is_full() => {
                for (i, sample) in buffer.as_sequence().iter().enumerate() {
                    log::trace!("real time interval #{}: {}ns", i, sample.as_nanos());
                }
                self.close(SessionState::Completed, Ok(buffer.as_sequence().to_vec()))
            }
            (_, Ok(buffer)) => {
                let e = Error::InvariantViolation(format!(
                    "session ended with {} of {} samples",
                    buffer.len(),
                    buffer.capacity()
                ));
                self.close(SessionState::Faulted, Err(e))
            }
        }
    }
}
