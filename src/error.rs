use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    InvalidArgument(String),
    ResourceExhausted(String),
    Interrupted,
    TransferFault(String),
    InvariantViolation(String),
    UnknownCommand(u32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::ResourceExhausted(msg) => write!(f, "resource exhausted: {}", msg),
            Error::Interrupted => write!(f, "sampling session interrupted"),
            Error::TransferFault(msg) => write!(f, "result transfer failed: {}", msg),
            Error::InvariantViolation(msg) => write!(f, "invariant violated: {}", msg),
            Error::UnknownCommand(cmd) => write!(f, "unknown device command: {:#010x}", cmd),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
