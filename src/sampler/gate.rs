use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::OnceLock;
use std::thread::{self, Thread};
use std::time::Duration;

/// Something that can tell a suspended caller it was interrupted from outside.
pub trait InterruptSource: Send + Sync {
    fn is_interrupted(&self) -> bool;
}

impl InterruptSource for AtomicBool {
    fn is_interrupted(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

/// How a wait on the gate ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    Faulted,
    Interrupted,
}

const PENDING: u8 = 0;
const COMPLETED: u8 = 1;
const FAULTED: u8 = 2;

/// Single-waiter, single-signaler handoff between the caller and the firing
/// context.
///
/// The waiter must call [`WaitGate::prepare_wait`] before the timer is armed
/// and [`WaitGate::wait`] after. A signal that lands in between leaves an
/// unpark token behind, so the later wait returns without blocking.
#[derive(Debug, Default)]
pub struct WaitGate {
    state: AtomicU8,
    waiter: OnceLock<Thread>,
}

impl WaitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the calling thread as the one context to wake. Called once
    /// per gate; the gate is not reusable across waiters.
    pub fn prepare_wait(&self) {
        let registered = self.waiter.set(thread::current()).is_ok();
        debug_assert!(registered, "wait gate already has a waiter");
    }

    pub fn signal_complete(&self) {
        self.signal(COMPLETED);
    }

    pub fn signal_fault(&self) {
        self.signal(FAULTED);
    }

    fn signal(&self, terminal: u8) {
        // Release pairs with the Acquire in `outcome`: buffer writes made by
        // the firing context are visible once the waiter sees the state.
        self.state.store(terminal, Ordering::Release);
        if let Some(waiter) = self.waiter.get() {
            waiter.unpark();
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state.load(Ordering::Acquire) == COMPLETED
    }

    fn outcome(&self) -> Option<WaitOutcome> {
        match self.state.load(Ordering::Acquire) {
            PENDING => None,
            COMPLETED => Some(WaitOutcome::Completed),
            FAULTED => Some(WaitOutcome::Faulted),
            other => unreachable!("wait gate state {}", other),
        }
    }

    /// Suspends until the firing context signals or `interrupt` reports an
    /// external interruption. `slice` bounds how long a single park lasts
    /// before the interruption source is polled again.
    pub fn wait(&self, interrupt: &dyn InterruptSource, slice: Duration) -> WaitOutcome {
        loop {
            if let Some(outcome) = self.outcome() {
                return outcome;
            }
            if interrupt.is_interrupted() {
                // A signal may have raced the interruption; completion wins.
                return self.outcome().unwrap_or(WaitOutcome::Interrupted);
            }
            thread::park_timeout(slice);
        }
    }
}
