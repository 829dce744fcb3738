use std::time::Duration;

/// Summary of one sampling run, all values in nanoseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
    pub drift: f64,
}

fn as_ns(d: &Duration) -> f64 {
    d.as_nanos() as f64
}

/// Arithmetic mean of the samples.
pub fn mean(samples: &[Duration]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(as_ns).sum::<f64>() / samples.len() as f64
}

/// Population standard deviation: the per-firing jitter.
pub fn stddev(samples: &[Duration]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    let var = samples
        .iter()
        .map(|d| {
            let diff = as_ns(d) - m;
            diff * diff
        })
        .sum::<f64>()
        / samples.len() as f64;
    var.sqrt()
}

/// Cumulative deviation of the whole run from `samples.len()` ideal intervals.
/// Positive means the timer ran slow.
pub fn drift(samples: &[Duration], interval: Duration) -> f64 {
    let total: f64 = samples.iter().map(as_ns).sum();
    total - samples.len() as f64 * as_ns(&interval)
}

pub fn summarize(samples: &[Duration], interval: Duration) -> Summary {
    if samples.is_empty() {
        return Summary {
            count: 0,
            total: 0.0,
            mean: 0.0,
            min: 0.0,
            max: 0.0,
            stddev: 0.0,
            drift: 0.0,
        };
    }
    Summary {
        count: samples.len(),
        total: samples.iter().map(as_ns).sum(),
        mean: mean(samples),
        min: samples.iter().map(as_ns).fold(f64::INFINITY, f64::min),
        max: samples.iter().map(as_ns).fold(f64::NEG_INFINITY, f64::max),
        stddev: stddev(samples),
        drift: drift(samples, interval),
    }
}
