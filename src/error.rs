//! Error types for registration and dispatch.
//!
//! Two kinds of failure exist in this crate and they never mix:
//!
//! - [`ConfigError`] — structural errors raised while building a stack
//!   (setup phase). These are programmer mistakes and surface immediately
//!   from the registration methods.
//! - [`DispatchError`] — the in-flight error value that travels down the
//!   layer chain at request time. It is offered to error handlers in
//!   registration order and, if nothing consumes it, decides the terminal
//!   response status.

use std::any::Any;
use std::fmt;

use http::StatusCode;
use thiserror::Error;

/// Structural error raised during stack construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Mount prefixes are absolute path segments and must begin with `/`.
    #[error("mount prefix must begin with '/', got {0:?}")]
    InvalidPrefix(String),
}

/// The error value threaded through the dispatch chain.
///
/// Carries a human-readable description and an optional status code. When
/// the chain ends with the error unconsumed, the dispatcher applies the
/// status policy: `status()` wins if present, otherwise 500 unless the
/// response already carries a 4xx/5xx.
///
/// Convertible from plain strings for the common case:
///
/// ```
/// use midstack::DispatchError;
///
/// let err = DispatchError::from("upstream unavailable");
/// assert!(err.status().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct DispatchError {
    message: String,
    status: Option<StatusCode>,
}

impl DispatchError {
    /// Create an error with a description and no declared status.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Create an error that requests a specific terminal status code.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    /// The status code this error declares, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The error description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Convert a caught panic payload into a dispatch error.
    ///
    /// Panic payloads are `&str` or `String` for every `panic!` invocation
    /// with a message; anything else gets a generic description.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::new(format!("handler panicked: {detail}"))
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DispatchError {}

impl From<&str> for DispatchError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for DispatchError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
