use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{OutputFormat, TimeUnit};
use crate::logging::LogArgs;
use crate::sampler::ResolutionMode;

#[derive(Debug, Args)]
pub struct SamplerArgs {
    /// Tick rate of the coarse (kt) timer in Hz (1-10000)
    #[arg(long)]
    pub tick_hz: Option<u32>,

    /// Interruption polling slice while waiting, in ms (1-1000)
    #[arg(long)]
    pub wait_slice_ms: Option<u64>,
}

#[derive(Debug, Parser)]
#[command(
    name = "timerstats",
    version,
    about = "Measure the real intervals between periodic timer firings"
)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct Cli {
    /// Device node the sampler is reached through (a node named `compare`
    /// must be given with a directory, e.g. `./compare`)
    #[arg(required = true)]
    pub device: Option<PathBuf>,

    /// Timer interval in microseconds (1..30000000)
    #[arg(required = true)]
    pub interval_us: Option<u32>,

    /// Number of samples to take (1..1024)
    #[arg(required = true)]
    pub sample_count: Option<u32>,

    /// Timer type: hr (high resolution) or kt (tick based)
    #[arg(value_enum, required = true)]
    pub mode: Option<ResolutionMode>,

    /// Output format (default: tsv)
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Unit of printed durations (default: ms)
    #[arg(short = 'u', long = "unit", value_enum)]
    pub unit: Option<TimeUnit>,

    /// Write output to a file instead of stdout
    #[arg(short = 'o', long = "output-file")]
    pub output_file: Option<PathBuf>,

    /// Configuration file path (default: /etc/timerstats.toml)
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub sampler: SamplerArgs,

    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one kt and one hr session with the same parameters and compare drift
    Compare(CompareArgs),
}

#[derive(Debug, Parser)]
pub struct CompareArgs {
    /// Device node the sampler is reached through
    pub device: PathBuf,

    /// Timer interval in microseconds (1..30000000)
    pub interval_us: u32,

    /// Number of samples per session (1..1024)
    pub sample_count: u32,

    /// Unit of printed durations (default: ms)
    #[arg(short = 'u', long = "unit", value_enum)]
    pub unit: Option<TimeUnit>,

    /// Configuration file path (default: /etc/timerstats.toml)
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub sampler: SamplerArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_invocation() {
        let cli = Cli::try_parse_from(["timerstats", "/dev/timerstats0", "1000", "5", "hr"]).unwrap();
        assert_eq!(cli.device, Some(PathBuf::from("/dev/timerstats0")));
        assert_eq!(cli.interval_us, Some(1000));
        assert_eq!(cli.sample_count, Some(5));
        assert_eq!(cli.mode, Some(ResolutionMode::HighResolution));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_kt_mode_and_options() {
        let cli = Cli::try_parse_from([
            "timerstats", "/dev/null", "250", "3", "kt", "-u", "us", "-f", "summary", "--tick-hz",
            "1000",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(ResolutionMode::Coarse));
        assert_eq!(cli.unit, Some(TimeUnit::Us));
        assert_eq!(cli.format, Some(OutputFormat::Summary));
        assert_eq!(cli.sampler.tick_hz, Some(1000));
    }

    #[test]
    fn test_missing_arguments_rejected() {
        assert!(Cli::try_parse_from(["timerstats", "/dev/null", "1000"]).is_err());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["timerstats", "/dev/null", "1000", "5", "xx"]).is_err());
    }

    #[test]
    fn test_node_named_compare_needs_a_directory() {
        let cli = Cli::try_parse_from(["timerstats", "./compare", "1000", "5", "hr"]).unwrap();
        assert_eq!(cli.device, Some(PathBuf::from("./compare")));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_compare_subcommand() {
        let cli = Cli::try_parse_from(["timerstats", "compare", "/dev/null", "2000", "10"]).unwrap();
        match cli.command {
            Some(Command::Compare(args)) => {
                assert_eq!(args.interval_us, 2000);
                assert_eq!(args.sample_count, 10);
            }
            None => panic!("expected compare subcommand"),
        }
    }
}
