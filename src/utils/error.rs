//! Error types for EmbedPlayer
//!
//! This module defines custom error types used throughout the crate.
//! We use thiserror for convenient error type definitions and anyhow for
//! application-level error handling in the demo binary.

use thiserror::Error;

/// Main error type for EmbedPlayer
#[derive(Error, Debug)]
pub enum EmbedPlayerError {
    /// No known provider URL shape matched the input
    #[error("Unresolved source: {0}")]
    UnresolvedSource(String),

    /// The provider runtime script could not be fetched
    #[error("Script load error: {0}")]
    ScriptLoad(String),

    /// The external player constructor failed or the container was unusable
    #[error("Player creation error: {0}")]
    PlayerCreation(String),

    /// The external player reported a playback error callback
    #[error("Playback error {code}: {reason}")]
    Playback { code: u32, reason: String },

    /// Poll-cycle synchronization error
    #[error("Synchronization error: {0}")]
    Sync(String),

    /// Host surface errors (container, input, fullscreen)
    #[error("Host error: {0}")]
    Host(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// Generic error for unexpected situations
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EmbedPlayerError {
    /// Create an unresolved-source error carrying the offending input
    pub fn unresolved<S: Into<String>>(input: S) -> Self {
        EmbedPlayerError::UnresolvedSource(input.into())
    }

    /// Create a playback error from an engine-reported code and reason
    pub fn playback<S: Into<String>>(code: u32, reason: S) -> Self {
        EmbedPlayerError::Playback {
            code,
            reason: reason.into(),
        }
    }

    /// Whether this error ends the current player session.
    ///
    /// Terminal errors surface through `PlayerState.status`; everything else
    /// is recovered locally (logged and retried) and never reaches the host
    /// application.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EmbedPlayerError::UnresolvedSource(_)
                | EmbedPlayerError::ScriptLoad(_)
                | EmbedPlayerError::PlayerCreation(_)
                | EmbedPlayerError::Playback { .. }
        )
    }
}

/// Convenience type alias for Results in EmbedPlayer
pub type Result<T> = std::result::Result<T, EmbedPlayerError>;

/// Extension trait for converting other errors to EmbedPlayerError
pub trait IntoPlayerError<T> {
    /// Convert this error into an EmbedPlayerError with the given context
    fn loader_err(self, context: &str) -> Result<T>;
    fn creation_err(self, context: &str) -> Result<T>;
    fn sync_err(self, context: &str) -> Result<T>;
    fn host_err(self, context: &str) -> Result<T>;
    fn config_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoPlayerError<T> for std::result::Result<T, E> {
    fn loader_err(self, context: &str) -> Result<T> {
        self.map_err(|e| EmbedPlayerError::ScriptLoad(format!("{}: {}", context, e)))
    }

    fn creation_err(self, context: &str) -> Result<T> {
        self.map_err(|e| EmbedPlayerError::PlayerCreation(format!("{}: {}", context, e)))
    }

    fn sync_err(self, context: &str) -> Result<T> {
        self.map_err(|e| EmbedPlayerError::Sync(format!("{}: {}", context, e)))
    }

    fn host_err(self, context: &str) -> Result<T> {
        self.map_err(|e| EmbedPlayerError::Host(format!("{}: {}", context, e)))
    }

    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| EmbedPlayerError::Config(format!("{}: {}", context, e)))
    }
}

/// Helper macro for creating internal errors with file and line information
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::utils::error::EmbedPlayerError::Internal(
            format!("{} at {}:{}", $msg, file!(), line!())
        )
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::utils::error::EmbedPlayerError::Internal(
            format!("{} at {}:{}", format!($fmt, $($arg)*), file!(), line!())
        )
    };
}
