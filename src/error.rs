use crate::kind::InstrumentKind;
use crate::session::SessionState;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown instrument kind: '{0}'. Run 'profsession kinds' to see valid names.")]
    UnknownInstrumentKind(String),

    #[error("Output directory unavailable: {}: {source}", path.display())]
    OutputDirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A profiling session is already running in this process")]
    SessionAlreadyRunning,

    #[error("Could not start {kind} instrument: {reason}")]
    InstrumentStart { kind: InstrumentKind, reason: String },

    #[error("Could not write {kind} output: {source}")]
    OutputWrite {
        kind: InstrumentKind,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not create output file {}: {source}", path.display())]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session is {actual}, expected {expected}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    #[error("Interrupt hook error: {0}")]
    InterruptHook(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGUMENTS: i32 = 2;
    pub const SESSION_ALREADY_RUNNING: i32 = 3;
    pub const OUTPUT_DIR_UNAVAILABLE: i32 = 4;
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::UnknownInstrumentKind(_) | Error::InvalidArgument(_) => {
                exit_code::INVALID_ARGUMENTS
            }
            Error::SessionAlreadyRunning => exit_code::SESSION_ALREADY_RUNNING,
            Error::OutputDirUnavailable { .. } => exit_code::OUTPUT_DIR_UNAVAILABLE,
            _ => exit_code::GENERAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            Error::UnknownInstrumentKind("x".into()).exit_code(),
            exit_code::INVALID_ARGUMENTS
        );
        assert_eq!(
            Error::SessionAlreadyRunning.exit_code(),
            exit_code::SESSION_ALREADY_RUNNING
        );
        let io = std::io::Error::other("boom");
        assert_eq!(Error::Io(io).exit_code(), exit_code::GENERAL_ERROR);
    }
}
