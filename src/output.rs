use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::config::{OutputFormat, TimeUnit};
use crate::stats;

/// Writes the measured series to stdout or a file in the specified format.
pub fn write_output(
    interval: Duration,
    samples: &[Duration],
    format: OutputFormat,
    unit: TimeUnit,
    output_file: Option<&Path>,
) -> io::Result<()> {
    match output_file {
        Some(path) => {
            let f = File::create(path)?;
            let mut out = BufWriter::new(f);
            format_output(interval, samples, format, unit, &mut out)?;
            out.flush()
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            format_output(interval, samples, format, unit, &mut out)?;
            out.flush()
        }
    }
}

fn scaled(d: Duration, unit: TimeUnit) -> f64 {
    d.as_nanos() as f64 / unit.nanos_per_unit()
}

fn format_output(
    interval: Duration,
    samples: &[Duration],
    format: OutputFormat,
    unit: TimeUnit,
    out: &mut dyn Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Tsv => {
            write!(out, "{:6.2}", scaled(interval, unit))?;
            for s in samples {
                write!(out, "\t{:8.2}", scaled(*s, unit))?;
            }
            writeln!(out)?;
        }
        OutputFormat::Lines => {
            for s in samples {
                writeln!(out, "{:.2}", scaled(*s, unit))?;
            }
        }
        OutputFormat::Summary => {
            write_summary(&stats::summarize(samples, interval), interval, unit, out)?;
        }
    }
    Ok(())
}

/// Key/value report of one run, values in `unit`.
pub fn write_summary(
    summary: &stats::Summary,
    interval: Duration,
    unit: TimeUnit,
    out: &mut dyn Write,
) -> io::Result<()> {
    let per = unit.nanos_per_unit();
    let u = unit.suffix();
    writeln!(out, "samples:  {}", summary.count)?;
    writeln!(out, "interval: {:.2}{}", scaled(interval, unit), u)?;
    writeln!(out, "mean:     {:.2}{}", summary.mean / per, u)?;
    writeln!(out, "min:      {:.2}{}", summary.min / per, u)?;
    writeln!(out, "max:      {:.2}{}", summary.max / per, u)?;
    writeln!(out, "jitter:   {:.2}{}", summary.stddev / per, u)?;
    writeln!(out, "drift:    {:+.2}{}", summary.drift / per, u)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_to_string(samples: &[u64], format: OutputFormat, unit: TimeUnit) -> String {
        let samples: Vec<Duration> = samples.iter().map(|&ns| Duration::from_nanos(ns)).collect();
        let mut buf = Vec::new();
        format_output(Duration::from_millis(1), &samples, format, unit, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_tsv_milliseconds() {
        let out = format_to_string(&[1_000_000, 1_250_000], OutputFormat::Tsv, TimeUnit::Ms);
        assert_eq!(out, "  1.00\t    1.00\t    1.25\n");
    }

    #[test]
    fn test_tsv_microseconds_matches_reference_client() {
        let out = format_to_string(&[1_004_321], OutputFormat::Tsv, TimeUnit::Us);
        assert_eq!(out, "1000.00\t 1004.32\n");
    }

    #[test]
    fn test_lines() {
        let out = format_to_string(&[1_500, 2_000], OutputFormat::Lines, TimeUnit::Us);
        assert_eq!(out, "1.50\n2.00\n");
    }

    #[test]
    fn test_summary() {
        let out = format_to_string(&[900_000, 1_100_000], OutputFormat::Summary, TimeUnit::Ms);
        assert!(out.contains("samples:  2\n"));
        assert!(out.contains("mean:     1.00ms\n"));
        assert!(out.contains("min:      0.90ms\n"));
        assert!(out.contains("jitter:   0.10ms\n"));
        assert!(out.contains("drift:    +0.00ms\n"));
    }

    #[test]
    fn test_write_to_file() {
        let path = std::env::temp_dir().join("timerstats_test_output.tsv");
        write_output(
            Duration::from_millis(2),
            &[Duration::from_millis(2)],
            OutputFormat::Tsv,
            TimeUnit::Ms,
            Some(&path),
        )
        .unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "  2.00\t    2.00\n");
        let _ = std::fs::remove_file(&path);
    }
}
