//! Backend-neutral error taxonomy.
//!
//! The public API never throws or panics on application-triggered error
//! paths (spec §7): creation routines return `None`, boolean queries return
//! `false`, and submission-time logic errors are logged and skipped. This
//! module defines the `Result`/`Error` types used internally to carry a
//! reason through to the point where it is either surfaced or logged.
use std::error::Error as StdError;
use std::fmt;

/// Coarse-grained reason a fallible operation failed.
///
/// `GpuTimeout` is intentionally absent: per spec §7 it is not a value this
/// type carries, but the *absence* of fence completion observed through
/// `query_fence`/`wait_for_fences`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// No requested backend is available on this system.
    BackendUnavailable,
    /// A resource or memory allocation could not be satisfied.
    AllocationFailed,
    /// Shader or pipeline compilation failed.
    CompilationFailed,
    /// The requested texture format is not supported for the given usage.
    UnsupportedFormat,
    /// The requested swapchain composition is not supported.
    UnsupportedComposition,
    /// The requested present mode is not supported.
    UnsupportedPresentMode,
    /// An illegal combination of usage flags, or a call made in the wrong
    /// pass phase.
    InvalidUsage,
    /// The shader format is not recognized by this backend.
    IncompatibleShaderFormat,
    /// The device became lost due to a hardware/software error.
    DeviceLost,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match *self {
            ErrorKind::BackendUnavailable => "no requested backend is available",
            ErrorKind::AllocationFailed => "resource allocation failed",
            ErrorKind::CompilationFailed => "shader or pipeline compilation failed",
            ErrorKind::UnsupportedFormat => "texture format is not supported for this usage",
            ErrorKind::UnsupportedComposition => "swapchain composition is not supported",
            ErrorKind::UnsupportedPresentMode => "present mode is not supported",
            ErrorKind::InvalidUsage => "invalid usage",
            ErrorKind::IncompatibleShaderFormat => "incompatible shader format",
            ErrorKind::DeviceLost => "device lost",
        }
    }
}

/// The error type returned by fallible internal operations.
///
/// Carries a [`ErrorKind`] plus an optional boxed cause for diagnostics.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, cause: None }
    }

    pub fn with_cause<E>(kind: ErrorKind, cause: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self {
            kind,
            cause: Some(cause.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.kind.as_str(), cause),
            None => write!(f, "{}", self.kind.as_str()),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(|c| c.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

/// The result type used throughout the neutral runtime.
pub type Result<T> = std::result::Result<T, Error>;
