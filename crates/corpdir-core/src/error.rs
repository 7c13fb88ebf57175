//! Error types for directory operations.
//!
//! Every protocol-level failure is surfaced to the caller as a distinct,
//! inspectable error value. Nothing is retried here and nothing is treated as
//! fatal to the process; only the immediate call fails.

use thiserror::Error;

/// Main error type for directory operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Dialing the directory server or negotiating TLS failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A service-account or user bind was rejected
    #[error("Bind rejected: {0}")]
    Bind(String),

    /// A search failed at the protocol level
    #[error("Search failed: {0}")]
    Search(String),

    /// No directory entry matched the query
    #[error("Not found: {0}")]
    NotFound(String),

    /// More than one entry matched where exactly one was required
    #[error("Ambiguous result: {0}")]
    AmbiguousResult(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Specialized result type for directory operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the stable error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "CONNECTION_FAILED",
            Self::Bind(_) => "BIND_REJECTED",
            Self::Search(_) => "SEARCH_FAILED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AmbiguousResult(_) => "AMBIGUOUS_RESULT",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Returns true if this error should be logged as a serious error.
    ///
    /// Rejected credentials and empty lookups are expected outcomes for a
    /// directory client; infrastructure failures are not.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::ConfigError(_))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(
            Error::Connection("test".to_string()).error_code(),
            "CONNECTION_FAILED"
        );
        assert_eq!(Error::Bind("test".to_string()).error_code(), "BIND_REJECTED");
        assert_eq!(
            Error::Search("test".to_string()).error_code(),
            "SEARCH_FAILED"
        );
        assert_eq!(
            Error::NotFound("test".to_string()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            Error::AmbiguousResult("test".to_string()).error_code(),
            "AMBIGUOUS_RESULT"
        );
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(
            Error::ValidationError("test".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn error_display() {
        let err = Error::Connection("ldap.example.com:636 refused".to_string());
        assert_eq!(
            err.to_string(),
            "Connection failed: ldap.example.com:636 refused"
        );

        let err = Error::NotFound("user `jdoe`".to_string());
        assert_eq!(err.to_string(), "Not found: user `jdoe`");
    }

    #[test]
    fn should_log_severity() {
        assert!(Error::Connection("test".to_string()).should_log());
        assert!(Error::ConfigError("test".to_string()).should_log());

        assert!(!Error::Bind("test".to_string()).should_log());
        assert!(!Error::NotFound("test".to_string()).should_log());
        assert!(!Error::AmbiguousResult("test".to_string()).should_log());
    }

    #[test]
    fn error_clone_and_eq() {
        let err = Error::NotFound("test".to_string());
        let cloned = err.clone();
        assert_eq!(err, cloned);
        assert_ne!(err, Error::NotFound("other".to_string()));
    }
}
