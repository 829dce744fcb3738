pub mod buffer;
pub mod driver;
pub mod gate;
pub mod policy;
pub mod session;
pub mod timer;

use std::sync::Arc;
use std::time::Duration;

use crate::config::SamplerConfig;
use crate::error::Error;

use gate::InterruptSource;
use policy::{CoarsePolicy, HighResPolicy, RearmPolicy};
use session::SamplingSession;
use timer::TimerSource;

/// Largest number of samples a single session may collect.
pub const MAX_SAMPLES: u32 = 1024;

/// Longest interval a session accepts.
pub const MAX_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ResolutionMode {
    /// Tick-granular timer, re-armed relative to the current tick
    #[value(name = "kt")]
    Coarse,
    /// High-resolution timer, re-armed on an absolute grid
    #[value(name = "hr")]
    HighResolution,
}

impl ResolutionMode {
    pub fn name(&self) -> &'static str {
        match self {
            ResolutionMode::Coarse => "kt",
            ResolutionMode::HighResolution => "hr",
        }
    }

    fn policy(self, interval: Duration, tick: Duration) -> Box<dyn RearmPolicy> {
        match self {
            ResolutionMode::Coarse => Box::new(CoarsePolicy::new(interval, tick)),
            ResolutionMode::HighResolution => Box::new(HighResPolicy::new(interval)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingRequest {
    pub interval: Duration,
    pub count: u32,
    pub mode: ResolutionMode,
}

impl SamplingRequest {
    pub fn validate(&self) -> Result<(), Error> {
        if self.interval.is_zero() || self.interval > MAX_INTERVAL {
            return Err(Error::InvalidArgument(format!(
                "time interval {}us, must be 1..{}us",
                self.interval.as_micros(),
                MAX_INTERVAL.as_micros()
            )));
        }
        if self.count == 0 || self.count > MAX_SAMPLES {
            return Err(Error::InvalidArgument(format!(
                "number of samples {}, must be 1..{}",
                self.count, MAX_SAMPLES
            )));
        }
        Ok(())
    }
}

/// Runs sampling sessions on one timer source, one at a time.
pub struct Sampler {
    timer: Arc<dyn TimerSource>,
    interrupt: Arc<dyn InterruptSource>,
    config: SamplerConfig,
}

impl Sampler {
    pub fn new(
        timer: Arc<dyn TimerSource>,
        interrupt: Arc<dyn InterruptSource>,
        config: &SamplerConfig,
    ) -> Self {
        Self {
            timer,
            interrupt,
            config: config.clone(),
        }
    }

    /// Measures `count` successive timer periods of `interval` and returns
    /// them in firing order.
    pub fn run_sampling_session(
        &self,
        interval: Duration,
        count: u32,
        mode: ResolutionMode,
    ) -> Result<Vec<Duration>, Error> {
        self.run(SamplingRequest {
            interval,
            count,
            mode,
        })
    }

    pub fn run(&self, request: SamplingRequest) -> Result<Vec<Duration>, Error> {
        let mut session = SamplingSession::new(
            request,
            Arc::clone(&self.timer),
            &*self.interrupt,
            &self.config,
        );
        let result = session.run();
        log::debug!(
            "{} session ({} x {}us) ended {:?}",
            request.mode.name(),
            request.count,
            request.interval.as_micros(),
            session.terminal_state().unwrap_or(session.state())
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use timer::testing::SimulatedTimer;

    fn request(interval_us: u64, count: u32) -> SamplingRequest {
        SamplingRequest {
            interval: Duration::from_micros(interval_us),
            count,
            mode: ResolutionMode::HighResolution,
        }
    }

    #[test]
    fn test_validate_accepts_bounds() {
        assert!(request(1, 1).validate().is_ok());
        assert!(request(30_000_000, 1024).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        for req in [
            request(0, 5),
            request(30_000_001, 5),
            request(1000, 0),
            request(1000, 1025),
        ] {
            assert!(
                matches!(req.validate(), Err(Error::InvalidArgument(_))),
                "{:?} should be rejected",
                req
            );
        }
    }

    #[test]
    fn test_validate_rejects_sub_microsecond_overshoot() {
        let req = SamplingRequest {
            interval: MAX_INTERVAL + Duration::from_nanos(1),
            ..request(1, 1)
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(ResolutionMode::Coarse.name(), "kt");
        assert_eq!(ResolutionMode::HighResolution.name(), "hr");
    }

    #[test]
    fn test_sampler_entry_point() {
        let timer = Arc::new(SimulatedTimer::new(0, 0));
        let sampler = Sampler::new(
            timer.clone(),
            Arc::new(AtomicBool::new(false)),
            &SamplerConfig::default(),
        );
        let samples = sampler
            .run_sampling_session(Duration::from_millis(2), 3, ResolutionMode::HighResolution)
            .unwrap();
        assert_eq!(samples, vec![Duration::from_millis(2); 3]);
        assert_eq!(timer.expirations(), 3);
    }
}
