//! Configuration module for dotenv-guard
//!
//! This module provides:
//! - Key directory and default file resolution
//! - Load options for host integrations

pub mod paths;
pub mod settings;

pub use paths::GuardPaths;
pub use settings::{EncryptionMode, LoadOptions};
