//! Error handling for the radiodial core
//!
//! This module defines the custom error type and a Result alias used
//! throughout the crate. Transport trouble is deliberately non-fatal: the
//! poller reports a skipped cycle and keeps serving the previous snapshot,
//! so most of these errors surface as log lines rather than aborts.

use thiserror::Error;

/// Main error type for radiodial operations
#[derive(Error, Debug)]
pub enum RadioDialError {
    /// Errors raised by the console transport (bus open/transfer failures)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A transport read returned fewer bytes than the wire record needs
    #[error("Short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// I2C bus errors from the hardware transport
    #[cfg(feature = "i2c-console")]
    #[error("I2C error: {0}")]
    I2c(#[from] rppal::i2c::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<RadioDialError>,
    },
}

impl RadioDialError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        RadioDialError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for radiodial operations
pub type Result<T> = std::result::Result<T, RadioDialError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
