//! Load options for dotenv-guard
//!
//! Mirrors the options a host application passes when it loads its env
//! file: which file, whether it should rest encrypted, and whether to
//! validate the result against a schema.

use std::path::{Path, PathBuf};

use super::paths::{DEFAULT_ENV_FILE, DEFAULT_POLICY_FILE, DEFAULT_SCHEMA_FILE};

/// Desired at-rest state of the env file after loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionMode {
    /// Encrypt plaintext values (per policy) and write them back (default)
    #[default]
    Encrypted,
    /// Decrypt any encrypted values and write the file back as plaintext
    Plaintext,
}

impl EncryptionMode {
    /// Map the boolean `enc` flag used by host integrations
    pub fn from_flag(enc: bool) -> Self {
        if enc {
            Self::Encrypted
        } else {
            Self::Plaintext
        }
    }
}

/// Options for [`crate::load`]
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Env file to load
    pub path: PathBuf,
    /// Desired at-rest state
    pub mode: EncryptionMode,
    /// Selective-encryption policy file (optional on disk)
    pub policy: PathBuf,
    /// Validate the loaded environment against a schema
    pub validate: bool,
    /// Schema file used when `validate` is set
    pub schema: PathBuf,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_ENV_FILE),
            mode: EncryptionMode::default(),
            policy: PathBuf::from(DEFAULT_POLICY_FILE),
            validate: false,
            schema: PathBuf::from(DEFAULT_SCHEMA_FILE),
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    pub fn mode(mut self, mode: EncryptionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn policy(mut self, policy: impl AsRef<Path>) -> Self {
        self.policy = policy.as_ref().to_path_buf();
        self
    }

    /// Enable validation against the given schema file
    pub fn validate_with(mut self, schema: impl AsRef<Path>) -> Self {
        self.validate = true;
        self.schema = schema.as_ref().to_path_buf();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = LoadOptions::default();
        assert_eq!(opts.path, PathBuf::from(".env"));
        assert_eq!(opts.mode, EncryptionMode::Encrypted);
        assert_eq!(opts.policy, PathBuf::from("env.enc.json"));
        assert!(!opts.validate);
    }

    #[test]
    fn test_builder() {
        let opts = LoadOptions::new()
            .path(".env.test")
            .mode(EncryptionMode::Plaintext)
            .validate_with("schema.json");
        assert_eq!(opts.path, PathBuf::from(".env.test"));
        assert_eq!(opts.mode, EncryptionMode::Plaintext);
        assert!(opts.validate);
        assert_eq!(opts.schema, PathBuf::from("schema.json"));
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(EncryptionMode::from_flag(true), EncryptionMode::Encrypted);
        assert_eq!(EncryptionMode::from_flag(false), EncryptionMode::Plaintext);
    }
}
