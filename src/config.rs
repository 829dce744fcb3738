use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Milliseconds
    Ms,
    /// Microseconds
    Us,
    /// Nanoseconds
    Ns,
}

impl TimeUnit {
    pub fn nanos_per_unit(self) -> f64 {
        match self {
            TimeUnit::Ms => 1_000_000.0,
            TimeUnit::Us => 1_000.0,
            TimeUnit::Ns => 1.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Ms => "ms",
            TimeUnit::Us => "us",
            TimeUnit::Ns => "ns",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Interval followed by every sample, tab-separated on one line
    Tsv,
    /// One sample per line
    Lines,
    /// Mean, min, max, jitter and drift
    Summary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Tick rate of the coarse timer in Hz
    pub tick_hz: u32,
    /// Longest a suspended session sleeps before rechecking for interruption
    pub wait_slice_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            tick_hz: 250,
            wait_slice_ms: 50,
        }
    }
}

impl SamplerConfig {
    /// Clamp fields to valid ranges.
    pub fn validate(&mut self) {
        self.tick_hz = self.tick_hz.clamp(1, 10_000);
        self.wait_slice_ms = self.wait_slice_ms.clamp(1, 1000);
    }

    pub fn tick(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_hz.max(1)))
    }

    pub fn wait_slice(&self) -> Duration {
        Duration::from_millis(self.wait_slice_ms.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub unit: TimeUnit,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            unit: TimeUnit::Ms,
            format: OutputFormat::Tsv,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampler: SamplerConfig,
    pub output: OutputConfig,
}

/// Load configuration from a TOML file.
///
/// - If `explicit_path` is `Some` and the file is missing, returns an error.
/// - If `explicit_path` is `None`, tries `/etc/timerstats.toml`; if missing, returns defaults.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config, Error> {
    let path = match explicit_path {
        Some(p) => {
            if !p.exists() {
                return Err(Error::InvalidArgument(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => {
            let default = Path::new("/etc/timerstats.toml");
            if !default.exists() {
                return Ok(Config::default());
            }
            default.to_path_buf()
        }
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        Error::InvalidArgument(format!("failed to read config {}: {}", path.display(), e))
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| {
        Error::InvalidArgument(format!("failed to parse config {}: {}", path.display(), e))
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.sampler.tick_hz, 250);
        assert_eq!(cfg.sampler.wait_slice_ms, 50);
        assert_eq!(cfg.sampler.tick(), Duration::from_millis(4));
        assert_eq!(cfg.output.unit, TimeUnit::Ms);
        assert_eq!(cfg.output.format, OutputFormat::Tsv);
    }

    #[test]
    fn test_validate_clamps() {
        let mut cfg = SamplerConfig {
            tick_hz: 0,
            wait_slice_ms: 5000,
        };
        cfg.validate();
        assert_eq!(cfg.tick_hz, 1);
        assert_eq!(cfg.wait_slice_ms, 1000);

        let mut cfg = SamplerConfig {
            tick_hz: 50_000,
            wait_slice_ms: 0,
        };
        cfg.validate();
        assert_eq!(cfg.tick_hz, 10_000);
        assert_eq!(cfg.wait_slice_ms, 1);
        assert_eq!(cfg.tick(), Duration::from_micros(100));
    }

    #[test]
    fn test_unit_scaling() {
        assert_eq!(TimeUnit::Ms.nanos_per_unit(), 1e6);
        assert_eq!(TimeUnit::Us.nanos_per_unit(), 1e3);
        assert_eq!(TimeUnit::Ns.suffix(), "ns");
    }

    #[test]
    fn test_toml_parsing() {
        let dir = std::env::temp_dir();
        let path = dir.join("timerstats_test_config.toml");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            write!(
                f,
                r#"
[sampler]
tick_hz = 1000

[output]
unit = "us"
"#
            )
            .unwrap();
        }
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.sampler.tick_hz, 1000);
        assert_eq!(config.output.unit, TimeUnit::Us);
        // Unset fields should get defaults
        assert_eq!(config.sampler.wait_slice_ms, 50);
        assert_eq!(config.output.format, OutputFormat::Tsv);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_explicit_config_errors() {
        let path = std::path::Path::new("/tmp/timerstats_nonexistent_config.toml");
        let result = load_config(Some(path));
        assert!(result.is_err());
    }
}
