use std::fs::{File, OpenOptions};
use std::mem;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::sampler::{ResolutionMode, Sampler};

pub const IOCTL_MAGIC: u8 = 0xa9;

const IOC_READ_WRITE: u32 = 3;

/// `_IOWR(IOCTL_MAGIC, nr, struct run_request *)`
const fn iowr(nr: u8) -> u32 {
    (IOC_READ_WRITE << 30)
        | ((mem::size_of::<usize>() as u32) << 16)
        | ((IOCTL_MAGIC as u32) << 8)
        | nr as u32
}

pub const IOCTL_RUN: u32 = iowr(1);
pub const IOCTL_RUN_HR: u32 = iowr(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Run,
    RunHr,
}

impl DeviceCommand {
    pub fn decode(cmd: u32) -> Result<Self, Error> {
        if (cmd >> 8) & 0xff != IOCTL_MAGIC as u32 {
            log::warn!("invalid ioctl magic in {:#010x}", cmd);
            return Err(Error::UnknownCommand(cmd));
        }
        match cmd {
            IOCTL_RUN => Ok(DeviceCommand::Run),
            IOCTL_RUN_HR => Ok(DeviceCommand::RunHr),
            _ => Err(Error::UnknownCommand(cmd)),
        }
    }

    pub fn for_mode(mode: ResolutionMode) -> Self {
        match mode {
            ResolutionMode::Coarse => DeviceCommand::Run,
            ResolutionMode::HighResolution => DeviceCommand::RunHr,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            DeviceCommand::Run => IOCTL_RUN,
            DeviceCommand::RunHr => IOCTL_RUN_HR,
        }
    }

    pub fn mode(self) -> ResolutionMode {
        match self {
            DeviceCommand::Run => ResolutionMode::Coarse,
            DeviceCommand::RunHr => ResolutionMode::HighResolution,
        }
    }
}

/// Argument block of a run command.
///
/// ```text
/// struct run_request {
///     unsigned int samples_count;  // 1..1024
///     unsigned int interval_us;    // 1..30000000
///     u64 *measurements;           // receives nanoseconds
///     ssize_t measurements_len;    // bytes, >= samples_count * 8
/// };
/// ```
#[derive(Debug)]
pub struct RunRequest<'a> {
    pub samples_count: u32,
    pub interval_us: u32,
    pub measurements: &'a mut [u64],
}

impl RunRequest<'_> {
    pub fn measurements_len(&self) -> usize {
        mem::size_of_val(&*self.measurements)
    }

    fn required_len(&self) -> usize {
        self.samples_count as usize * mem::size_of::<u64>()
    }
}

/// A sampler exposed through a device node.
pub struct Device {
    path: PathBuf,
    // Held open for the lifetime of the device, like a file handle on the node.
    _node: File,
    sampler: Sampler,
}

impl Device {
    pub fn open(path: &Path, sampler: Sampler) -> Result<Self, Error> {
        let node = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("cannot open {}: {}", path.display(), e),
                ))
            })?;
        log::info!("device opened: {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            _node: node,
            sampler,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs one sampling session and copies the samples into `req.measurements`.
    pub fn ioctl(&self, cmd: u32, req: &mut RunRequest<'_>) -> Result<(), Error> {
        let command = DeviceCommand::decode(cmd)?;

        if req.measurements_len() < req.required_len() {
            log::warn!("invalid parameters");
            return Err(Error::InvalidArgument(format!(
                "measurement buffer of {} bytes cannot hold {} samples",
                req.measurements_len(),
                req.samples_count
            )));
        }

        let samples = self.sampler.run_sampling_session(
            Duration::from_micros(u64::from(req.interval_us)),
            req.samples_count,
            command.mode(),
        )?;

        transfer(&samples, req.measurements).inspect_err(|e| log::warn!("{}", e))
    }
}

fn transfer(samples: &[Duration], dst: &mut [u64]) -> Result<(), Error> {
    let dst_len = dst.len();
    let dst = dst.get_mut(..samples.len()).ok_or_else(|| {
        Error::TransferFault(format!(
            "{} samples do not fit into {} slots",
            samples.len(),
            dst_len
        ))
    })?;
    for (slot, sample) in dst.iter_mut().zip(samples) {
        *slot = u64::try_from(sample.as_nanos()).map_err(|_| {
            Error::TransferFault(format!("sample {:?} exceeds 64-bit nanoseconds", sample))
        })?;
    }
    Ok(())
}
