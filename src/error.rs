//! Error types.
//!
//! Two layers:
//!
//! - [`SandError`]: typed failures raised by the calculation engine and the
//!   file/catalog collaborators. Callers can match on these to decide whether
//!   to skip, abort or prompt.
//! - [`AppError`]: what the binary reports (message + process exit code).

use thiserror::Error;

/// Failures raised by the sieve analysis engine and its loaders.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SandError {
    #[error("Unsupported sieve unit '{0}' (expected micron, mm, in, phi or mesh)")]
    UnsupportedUnit(String),

    #[error("Mesh {0} is not a US standard sieve size")]
    UnknownMeshSize(f64),

    #[error("Sample '{name}' has zero total retained weight")]
    EmptySample { name: String },

    #[error("Sample '{name}' has a degenerate distribution: {reason}")]
    DegenerateDistribution { name: String, reason: String },

    #[error("No proppant selected for the Constien criterion")]
    MissingProppant,

    #[error("{kind} '{name}' not found")]
    RecordNotFound { kind: RecordKind, name: String },

    #[error("Sample '{name}' is invalid: {reason}")]
    InvalidSample { name: String, reason: String },

    #[error("Malformed record in {source_name}: {reason}")]
    MalformedRecord { source_name: String, reason: String },
}

/// What kind of record a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Screen,
    Proppant,
    Sample,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RecordKind::Screen => "Screen",
            RecordKind::Proppant => "Proppant",
            RecordKind::Sample => "Sample",
        };
        f.write_str(label)
    }
}

impl SandError {
    pub fn not_found(kind: RecordKind, name: impl Into<String>) -> Self {
        SandError::RecordNotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn degenerate(name: &str, reason: impl Into<String>) -> Self {
        SandError::DegenerateDistribution {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_sample(name: &str, reason: impl Into<String>) -> Self {
        SandError::InvalidSample {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        SandError::MalformedRecord {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code used when this error terminates the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            SandError::UnsupportedUnit(_)
            | SandError::UnknownMeshSize(_)
            | SandError::RecordNotFound { .. }
            | SandError::InvalidSample { .. }
            | SandError::MalformedRecord { .. }
            | SandError::MissingProppant => 2,
            SandError::EmptySample { .. } | SandError::DegenerateDistribution { .. } => 3,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<SandError> for AppError {
    fn from(err: SandError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
