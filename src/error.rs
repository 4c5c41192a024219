// Error taxonomy shared by every layer of the toolkit
//
// Terminal conditions (ReachedTarget) travel through the same channel as hard
// faults, so callers branch on `Error::kind()` rather than on Ok/Err alone.

use crate::motor::FeetechError;

/// Coarse error classification used for branching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidConfiguration,
    InitFailed,
    OutOfRange,
    ReachedTarget,
    InvalidResource,
    Driver,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Initialization failed: {0}")]
    InitFailed(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Reached target: {0}")]
    ReachedTarget(String),

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("Motor bus error: {0}")]
    Driver(#[from] FeetechError),

    /// Several motors rejected a batch speed command
    #[error("Failed to apply speeds to {} motor(s):{}", failures.len(), format_failures(failures))]
    Actuation { kind: ErrorKind, failures: Vec<String> },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Error::InitFailed(_) => ErrorKind::InitFailed,
            Error::OutOfRange(_) => ErrorKind::OutOfRange,
            Error::ReachedTarget(_) => ErrorKind::ReachedTarget,
            Error::InvalidResource(_) => ErrorKind::InvalidResource,
            Error::Driver(_) => ErrorKind::Driver,
            Error::Actuation { kind, .. } => *kind,
        }
    }
}

fn format_failures(failures: &[String]) -> String {
    failures
        .iter()
        .map(|f| format!("\n  {}", f))
        .collect::<String>()
}
