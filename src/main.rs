mod cli;
mod compare;
mod config;
mod device;
mod error;
mod logging;
mod output;
mod sampler;
mod signal;
mod stats;

use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use cli::{Cli, Command, SamplerArgs};
use config::Config;
use device::{Device, DeviceCommand, RunRequest};
use error::Error;
use sampler::timer::SystemTimer;
use sampler::{Sampler, SamplingRequest};
use signal::SignalInterrupt;

/// Build the configuration by layering: defaults → TOML file → CLI overrides.
fn build_config(config_file: Option<&Path>, sampler_args: &SamplerArgs) -> Config {
    let mut cfg = match config::load_config(config_file) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("{}", e);
            Config::default()
        }
    };

    if let Some(v) = sampler_args.tick_hz {
        cfg.sampler.tick_hz = v;
    }
    if let Some(v) = sampler_args.wait_slice_ms {
        cfg.sampler.wait_slice_ms = v;
    }

    cfg.sampler.validate();
    cfg
}

fn open_device(path: &Path, cfg: &Config) -> Result<Device, Error> {
    signal::install_signal_handlers();
    let sampler = Sampler::new(Arc::new(SystemTimer), Arc::new(SignalInterrupt), &cfg.sampler);
    Device::open(path, sampler)
}

fn run_sample(cli: &Cli, cfg: &Config) -> Result<(), Error> {
    let (Some(path), Some(interval_us), Some(count), Some(mode)) =
        (cli.device.as_deref(), cli.interval_us, cli.sample_count, cli.mode)
    else {
        return Err(Error::InvalidArgument(
            "usage: timerstats <device> <interval-us> <sample-count> <hr|kt>".into(),
        ));
    };

    let request = SamplingRequest {
        interval: Duration::from_micros(u64::from(interval_us)),
        count,
        mode,
    };
    request.validate()?;

    let device = open_device(path, cfg)?;
    let mut measurements = vec![0u64; count as usize];
    let mut req = RunRequest {
        samples_count: count,
        interval_us,
        measurements: &mut measurements,
    };
    device.ioctl(DeviceCommand::for_mode(mode).code(), &mut req)?;

    let samples: Vec<Duration> = measurements.into_iter().map(Duration::from_nanos).collect();
    output::write_output(
        request.interval,
        &samples,
        cli.format.unwrap_or(cfg.output.format),
        cli.unit.unwrap_or(cfg.output.unit),
        cli.output_file.as_deref(),
    )?;
    Ok(())
}

fn main() {
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        let code = if e.use_stderr() { 1 } else { 0 };
        let _ = e.print();
        process::exit(code);
    });

    let result = match &cli.command {
        Some(Command::Compare(args)) => {
            logging::init(&args.log);
            let cfg = build_config(args.config_file.as_deref(), &args.sampler);
            compare::validate_request(args.interval_us, args.sample_count)
                .and_then(|()| open_device(&args.device, &cfg))
                .and_then(|device| {
                    compare::run(
                        &device,
                        args.interval_us,
                        args.sample_count,
                        args.unit.unwrap_or(cfg.output.unit),
                    )
                })
        }
        None => {
            logging::init(&cli.log);
            let cfg = build_config(cli.config_file.as_deref(), &cli.sampler);
            run_sample(&cli, &cfg)
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        process::exit(1);
    }
}
