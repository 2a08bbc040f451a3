use std::fmt;

use crate::storage::StorageError;

/// Message returned to callers for any failure that is not a [`Violation`].
///
/// The underlying detail only goes to the operational log.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal error occurred. Contact the data team for help.";

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while resolving feed access.
///
/// Only [`Error::Violation`] is considered caller-recoverable. Every other
/// variant is an internal fault and is reported to the caller with
/// [`GENERIC_INTERNAL_MESSAGE`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An authorization or validation rule rejected the request
    #[error(transparent)]
    Violation(#[from] Violation),

    /// The object store failed during an existence probe or while signing
    #[error("storage unavailable for '{path}'")]
    StorageUnavailable {
        /// Blob path being processed when the failure happened
        path: String,
        /// Backend failure
        #[source]
        source: StorageError,
    },

    /// The request body could not be decoded
    #[error("malformed request body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    /// Configuration could not be loaded or failed validation
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` when the failure may be shown to the caller verbatim.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Violation(_))
    }

    /// Returns the violation if this error is one.
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Error::Violation(v) => Some(v),
            _ => None,
        }
    }

    /// Message safe to hand back to the caller.
    pub fn client_message(&self) -> &str {
        match self {
            Error::Violation(v) => &v.message,
            _ => GENERIC_INTERNAL_MESSAGE,
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// A rejected request with details about which rule failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable message, returned to the caller as-is
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for an [`ViolationKind::InvalidArgument`] violation.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::InvalidArgument, message)
    }

    /// Returns `true` for authentication and authorization failures.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self.kind,
            ViolationKind::Unauthenticated
                | ViolationKind::UnsupportedAuthMethod
                | ViolationKind::Unauthorized
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Violation {}

/// The kind of violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// The caller is not authenticated
    Unauthenticated,
    /// The caller authenticated with a method other than the accepted one
    UnsupportedAuthMethod,
    /// The caller is authenticated but not mapped to a partner
    Unauthorized,
    /// A request parameter failed validation
    InvalidArgument,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Unauthenticated => write!(f, "Unauthenticated"),
            ViolationKind::UnsupportedAuthMethod => write!(f, "Unsupported authentication method"),
            ViolationKind::Unauthorized => write!(f, "Unauthorized"),
            ViolationKind::InvalidArgument => write!(f, "Invalid argument"),
        }
    }
}
