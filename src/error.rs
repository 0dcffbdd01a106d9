//! Custom error types for dotenv-guard
//!
//! This module defines the error hierarchy for the library using thiserror
//! for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for dotenv-guard operations
#[derive(Error, Debug)]
pub enum GuardError {
    /// An input file (env file, policy source) does not exist
    #[error("{} not found", path.display())]
    SourceFileNotFound { path: PathBuf },

    /// No override variable and no writable key directory
    #[error(
        "No writable directory found for master key storage. \
         Please set the DOTENV_GUARD_MASTER_KEY environment variable."
    )]
    KeyStorageUnavailable,

    /// The override variable or key file does not hold a 64 hex char key
    #[error("Invalid master key: {0}")]
    InvalidMasterKey(String),

    /// Value carries the `aes:` tag but is structurally malformed
    #[error("Invalid encrypted value format: {0}")]
    InvalidEncryptedFormat(String),

    /// The GCM tag did not verify (wrong key or tampered value)
    #[error("Decryption failed: wrong master key or tampered value")]
    DecryptionAuthFailure,

    /// A legacy `iv:cipher` value could not be decrypted here
    #[error(
        "Legacy encrypted value detected. \
         Run 'dotenv-guard migrate' with the legacy keychain available to convert it \
         to the current format."
    )]
    LegacyFormatDetected,

    /// The legacy keychain path is not compiled in or has no key
    #[error(
        "Legacy encrypted value detected but the legacy keychain is unavailable. \
         Rebuild with the 'legacy-keychain' feature on the machine holding the old key, \
         run 'dotenv-guard migrate', then return to the default build."
    )]
    LegacyDependencyMissing,

    /// Malformed selective-encryption policy
    #[error("Invalid encryption policy: {0}")]
    PolicyParse(String),

    /// Schema file could not be interpreted
    #[error("Schema error: {0}")]
    Schema(String),

    /// One or more schema violations, all of them collected
    #[error("validation failed:\n{}", violations.join("\n"))]
    SchemaValidationFailed { violations: Vec<String> },

    /// Cipher setup failures
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

impl GuardError {
    /// Create a "not found" error for a source file
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::SourceFileNotFound { path: path.into() }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SourceFileNotFound { .. })
    }

    /// Check if this error concerns a legacy-format value
    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            Self::LegacyFormatDetected | Self::LegacyDependencyMissing
        )
    }

    /// Check if this is a schema validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::SchemaValidationFailed { .. })
    }
}

impl From<std::io::Error> for GuardError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GuardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for dotenv-guard operations
pub type GuardResult<T> = Result<T, GuardError>;
