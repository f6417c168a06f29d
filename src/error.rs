//! Error types for shadowq.

use std::fmt;

use thiserror::Error;

/// The main error type for shadowq operations.
#[derive(Debug, Error)]
pub enum ShadowError {
    /// A builder argument was missing, blank or empty.
    #[error("Invalid argument '{param}': {message}")]
    InvalidArgument {
        param: &'static str,
        message: String,
    },

    /// The call is not valid for the current shape of the query or predicate.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A value of a type outside the supported scalar set was supplied.
    #[error("Unsupported type for '{param}': {type_name}")]
    UnsupportedType {
        param: &'static str,
        type_name: String,
    },

    /// The operation is not supported by this object.
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// A `first` terminal matched zero rows.
    #[error("Data not found: {0}")]
    NotFound(String),

    /// The database returned more rows than the terminal allows.
    #[error("Unexpected row count: expected at most {expected}, got {actual}")]
    Cardinality { expected: usize, actual: usize },

    /// Materialization was stopped through a cancellation token.
    #[error("Operation was cancelled")]
    Cancelled,

    /// Failed to parse a textual filter expression.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error raised by the database driver, passed through untouched.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl ShadowError {
    /// Create an invalid-argument error naming the offending parameter.
    pub fn invalid_argument(param: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            param,
            message: message.into(),
        }
    }

    /// Create an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// True for errors raised while building a query, before any SQL is sent.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::InvalidOperation(_) | Self::UnsupportedType { .. }
        )
    }
}

/// Error produced by a database driver.
///
/// Wraps whatever the underlying client library raised. `Display` and
/// `source()` forward to the wrapped error so the database text reaches the
/// caller unchanged.
pub struct DriverError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl DriverError {
    /// Wrap an arbitrary driver error.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self(err.into())
    }

    /// Create a driver error from a plain message.
    pub fn message(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self(message.into())
    }

    /// Borrow the wrapped error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// Try to downcast the wrapped error to a concrete driver type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Debug for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<sqlx::Error> for DriverError {
    fn from(err: sqlx::Error) -> Self {
        Self::new(err)
    }
}

/// Result type alias for shadowq operations.
pub type ShadowResult<T> = Result<T, ShadowError>;
