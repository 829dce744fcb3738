use std::io::{self, Write};
use std::time::Duration;

use crate::config::TimeUnit;
use crate::device::{Device, DeviceCommand, RunRequest};
use crate::error::Error;
use crate::sampler::{ResolutionMode, SamplingRequest};
use crate::stats::{self, Summary};

const MODES: [ResolutionMode; 2] = [ResolutionMode::Coarse, ResolutionMode::HighResolution];

fn run_mode(
    device: &Device,
    mode: ResolutionMode,
    interval_us: u32,
    count: u32,
) -> Result<Vec<Duration>, Error> {
    let mut measurements = vec![0u64; count as usize];
    let mut req = RunRequest {
        samples_count: count,
        interval_us,
        measurements: &mut measurements,
    };
    device.ioctl(DeviceCommand::for_mode(mode).code(), &mut req)?;
    Ok(measurements.into_iter().map(Duration::from_nanos).collect())
}

/// Mode whose cumulative drift stayed closest to zero.
fn steadiest(results: &[(ResolutionMode, Summary)]) -> Option<ResolutionMode> {
    results
        .iter()
        .min_by(|a, b| {
            a.1.drift
                .abs()
                .partial_cmp(&b.1.drift.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(mode, _)| *mode)
}

fn print_report(
    results: &[(ResolutionMode, Summary)],
    interval: Duration,
    unit: TimeUnit,
    out: &mut dyn Write,
) -> io::Result<()> {
    let per = unit.nanos_per_unit();
    let u = unit.suffix();
    writeln!(
        out,
        "--- Comparison ({} samples of {:.2}{}) ---",
        results.first().map(|(_, s)| s.count).unwrap_or(0),
        interval.as_nanos() as f64 / per,
        u
    )?;
    writeln!(
        out,
        "{:<6} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "Mode", "Mean", "Min", "Max", "Jitter", "Drift"
    )?;
    for (mode, s) in results {
        writeln!(
            out,
            "{:<6} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>+12.3}",
            mode.name(),
            s.mean / per,
            s.min / per,
            s.max / per,
            s.stddev / per,
            s.drift / per
        )?;
    }
    writeln!(out)?;
    if let Some(mode) = steadiest(results) {
        writeln!(out, "Verdict:")?;
        writeln!(out, "  Smallest drift: {}", mode.name())?;
    }
    Ok(())
}

/// Checks interval and count before any device is touched.
pub fn validate_request(interval_us: u32, count: u32) -> Result<(), Error> {
    for mode in MODES {
        SamplingRequest {
            interval: Duration::from_micros(u64::from(interval_us)),
            count,
            mode,
        }
        .validate()?;
    }
    Ok(())
}

/// Runs one session per timer type with identical parameters and prints how
/// they compare.
pub fn run(device: &Device, interval_us: u32, count: u32, unit: TimeUnit) -> Result<(), Error> {
    let interval = Duration::from_micros(u64::from(interval_us));
    let mut results = Vec::with_capacity(MODES.len());

    for mode in MODES {
        log::info!(
            "running {} session on {}: {} x {}us",
            mode.name(),
            device.path().display(),
            count,
            interval_us
        );
        let samples = run_mode(device, mode, interval_us, count)?;
        results.push((mode, stats::summarize(&samples, interval)));
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_report(&results, interval, unit, &mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(drift: f64) -> Summary {
        Summary {
            count: 5,
            total: 5_000_000.0 + drift,
            mean: 1_000_000.0 + drift / 5.0,
            min: 1_000_000.0,
            max: 1_000_000.0 + drift,
            stddev: 0.0,
            drift,
        }
    }

    #[test]
    fn test_validate_request_bounds() {
        assert!(validate_request(1000, 5).is_ok());
        assert!(matches!(
            validate_request(0, 5),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_request(1000, 1025),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_steadiest_picks_smallest_absolute_drift() {
        let results = vec![
            (ResolutionMode::Coarse, summary(-40_000.0)),
            (ResolutionMode::HighResolution, summary(500.0)),
        ];
        assert_eq!(steadiest(&results), Some(ResolutionMode::HighResolution));
        assert_eq!(steadiest(&[]), None);
    }

    #[test]
    fn test_report_layout() {
        let results = vec![
            (ResolutionMode::Coarse, summary(10_000_000.0)),
            (ResolutionMode::HighResolution, summary(500_000.0)),
        ];
        let mut buf = Vec::new();
        print_report(&results, Duration::from_millis(1), TimeUnit::Ms, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("--- Comparison (5 samples of 1.00ms) ---\n"));
        assert!(out.contains("kt "));
        assert!(out.contains("+10.000"));
        assert!(out.contains("  Smallest drift: hr\n"));
    }
}
