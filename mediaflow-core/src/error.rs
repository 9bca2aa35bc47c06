//! Error types shared across the mediaflow crates.
//!
//! Transient back-pressure ([`crate::status::SendStatus::Busy`],
//! [`crate::status::RecvStatus::NeedsInput`]) is part of normal control flow
//! and is deliberately absent from this taxonomy.

use thiserror::Error;

/// Shared error taxonomy for transform stages and unit handling.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller supplied an invalid or incompatible static parameter.
    ///
    /// Always caller-fixable; never retried automatically.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Allocation or memory failure. Propagated immediately, not retried.
    #[error("Resource exhausted: {0}")]
    Resource(String),

    /// Feature or format outside what this build supports.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Registry lookup failed for the given stage or filter identifier.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Opaque stage-specific failure surfaced mid-stream.
    ///
    /// The owning session must be closed; it is not safe to keep sending.
    #[error("Fatal stage error (code {code})")]
    Fatal {
        /// Stage-specific failure code.
        code: i32,
    },

    /// Caller protocol violation (use after close, input after end of
    /// stream). Indicates a bug in the caller, not a runtime condition.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a resource error.
    pub fn resource(msg: impl Into<String>) -> Self {
        Error::Resource(msg.into())
    }

    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Create a fatal stage error with an opaque code.
    pub fn fatal(code: i32) -> Self {
        Error::Fatal { code }
    }

    /// Check whether this error requires the owning session to be closed.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fatal { .. })
    }

    /// Check whether this error indicates a caller protocol violation.
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Error::InvalidState(_))
    }
}

/// Result type alias using the shared [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::configuration("bad frame size");
        assert_eq!(err.to_string(), "Configuration error: bad frame size");
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::fatal(-7).is_fatal());
        assert!(!Error::resource("oom").is_fatal());
    }

    #[test]
    fn test_is_protocol_violation() {
        assert!(Error::InvalidState("closed").is_protocol_violation());
        assert!(!Error::configuration("x").is_protocol_violation());
    }
}
