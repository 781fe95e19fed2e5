//! Secret resolution error types.
//!
//! Every backend and the resolution driver surface errors through
//! [`SecretsError`]. Construction failures of a backing store are fatal and
//! reported immediately; a missing secret is reported at resolve time and is
//! only recoverable through a declared default.

use std::path::PathBuf;

/// Unified error type for secret resolution.
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    // -- Resolution errors --------------------------------------------------
    /// The computed storage key has no value in the backing store and the
    /// field declared no default.
    #[error("missing secret for field `{field}`: no value at {backend} key `{key}`")]
    MissingSecret {
        /// Dotted path of the field from the schema root.
        field: String,
        /// Short name of the backend that was asked (`ini`, `env`, ...).
        backend: &'static str,
        /// The storage key that was looked up.
        key: String,
    },

    // -- Backing store errors -----------------------------------------------
    /// The backing store could not be read.
    #[error("secrets backing store unavailable at {}: {source}", .path.display())]
    BackingStoreUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The INI source is not well formed.
    #[error("malformed ini source {}:{line}: {reason}", .path.display())]
    MalformedIni {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    // -- Schema errors ------------------------------------------------------
    /// The schema tree cannot be resolved as declared.
    #[error("invalid schema: {reason}")]
    InvalidSchema { reason: String },
}

impl SecretsError {
    /// Returns `true` for [`SecretsError::MissingSecret`], the only variant a
    /// declared default can recover from.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingSecret { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SecretsError>;
