//! Path management for dotenv-guard
//!
//! Resolves every filesystem location the tool touches: the candidate
//! directories for the master key file and the default project files.
//!
//! ## Key directory candidates
//!
//! 1. `~/.dotenv-guard` (skipped when the home directory is `/`)
//! 2. `./.dotenv-guard` (containers and serverless with a writable cwd)
//! 3. `$TMPDIR/.dotenv-guard` (last resort)
//!
//! The `DOTENV_GUARD_MASTER_KEY` environment variable takes priority over
//! all of them.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

/// Environment variable that overrides any persisted master key
pub const MASTER_KEY_ENV: &str = "DOTENV_GUARD_MASTER_KEY";

/// Name of the per-candidate key directory
pub const KEY_DIR_NAME: &str = ".dotenv-guard";

/// File name of the persisted master key
pub const MASTER_KEY_FILE: &str = "master.key";

/// Default env file
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Default selective-encryption policy file
pub const DEFAULT_POLICY_FILE: &str = "env.enc.json";

/// Default validation schema file
pub const DEFAULT_SCHEMA_FILE: &str = "env.schema.json";

/// Manages the ordered list of key directories
#[derive(Debug, Clone)]
pub struct GuardPaths {
    key_dirs: Vec<PathBuf>,
}

impl GuardPaths {
    /// Build the default candidate list for this host
    pub fn new() -> Self {
        let mut key_dirs = Vec::with_capacity(3);

        if let Some(home) = home_dir() {
            key_dirs.push(home.join(KEY_DIR_NAME));
        }
        if let Ok(cwd) = std::env::current_dir() {
            key_dirs.push(cwd.join(KEY_DIR_NAME));
        }
        key_dirs.push(std::env::temp_dir().join(KEY_DIR_NAME));

        Self { key_dirs }
    }

    /// Use an explicit candidate list (useful for testing)
    pub fn with_candidates(key_dirs: Vec<PathBuf>) -> Self {
        Self { key_dirs }
    }

    /// Candidate key directories in priority order
    pub fn key_dirs(&self) -> &[PathBuf] {
        &self.key_dirs
    }

    /// Path of the key file inside a candidate directory
    pub fn key_file_in(dir: &Path) -> PathBuf {
        dir.join(MASTER_KEY_FILE)
    }
}

impl Default for GuardPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// Home directory, ignoring a root home (common for system users in containers)
fn home_dir() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    let home = base.home_dir();
    if home == Path::new("/") || home.as_os_str().is_empty() {
        return None;
    }
    Some(home.to_path_buf())
}
