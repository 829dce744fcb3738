use std::time::Duration;

use crate::error::Error;

/// Fixed-capacity, append-only series of measured intervals.
///
/// All slots are allocated up front and zeroed so the firing path never
/// allocates; slots are filled strictly in order.
#[derive(Debug)]
pub struct SampleBuffer {
    slots: Vec<Duration>,
    len: usize,
}

impl SampleBuffer {
    /// Allocates `capacity` zeroed slots, reporting allocation failure
    /// instead of aborting.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).map_err(|e| {
            Error::ResourceExhausted(format!("sample buffer of {} slots: {}", capacity, e))
        })?;
        slots.resize(capacity, Duration::ZERO);
        Ok(Self { slots, len: 0 })
    }

    /// Writes `sample` at the fill index and advances it.
    ///
    /// Appending to a full buffer means the timer fired more often than it
    /// was armed for, which is reported as an invariant violation.
    pub fn append(&mut self, sample: Duration) -> Result<(), Error> {
        let capacity = self.slots.len();
        let slot = self.slots.get_mut(self.len).ok_or_else(|| {
            Error::InvariantViolation(format!(
                "sample buffer overflow: capacity {} already filled",
                capacity
            ))
        })?;
        *slot = sample;
        self.len += 1;
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// The filled prefix, in firing order.
    pub fn as_sequence(&self) -> &[Duration] {
        &self.slots[..self.len]
    }
}
