//! Master key resolution and persistence
//!
//! Resolution order:
//! 1. The override environment variable (CI, containers, read-only disks)
//! 2. A `master.key` already persisted in one of the writable candidate
//!    directories
//! 3. A freshly generated key, persisted to the first writable candidate
//!
//! Candidates are probed by actually writing a file, since a directory
//! can exist and still reject writes (read-only mounts, foreign owner).

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::paths::{GuardPaths, MASTER_KEY_ENV};
use crate::error::{GuardError, GuardResult};

use super::MasterKey;

const WRITE_PROBE_FILE: &str = ".write-test";

/// Where a resolvable key currently lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// The override environment variable is set
    Override,
    /// A key file exists at this path
    File(PathBuf),
    /// Nothing yet; the next resolve will generate one
    Missing,
}

/// Resolves, persists and reports on the master key
#[derive(Debug, Clone)]
pub struct KeyStore {
    paths: GuardPaths,
    override_var: String,
}

impl KeyStore {
    /// Key store over the default candidate directories
    pub fn new() -> Self {
        Self::with_paths(GuardPaths::new())
    }

    /// Key store over an explicit candidate list
    pub fn with_paths(paths: GuardPaths) -> Self {
        Self {
            paths,
            override_var: MASTER_KEY_ENV.to_string(),
        }
    }

    /// Read the override from a different environment variable
    pub fn with_override_var(mut self, name: impl Into<String>) -> Self {
        self.override_var = name.into();
        self
    }

    /// Resolve the master key, generating and persisting one on first use
    ///
    /// Only candidate directories that accept writes are trusted. A
    /// directory is created only when a new key is persisted in it.
    pub fn resolve(&self) -> GuardResult<MasterKey> {
        if let Some(encoded) = self.override_value() {
            debug!(var = %self.override_var, "using master key from environment override");
            return MasterKey::from_hex(&encoded);
        }

        if let Some(key_path) = self.persisted_key() {
            debug!(path = %key_path.display(), "using persisted master key");
            return read_key_file(&key_path);
        }

        for ignored in self.key_files().filter(|path| path.is_file()) {
            warn!(path = %ignored.display(), "ignoring master key in a read-only directory");
        }

        let dir = self
            .paths
            .key_dirs()
            .iter()
            .find(|dir| prepare_dir(dir))
            .ok_or(GuardError::KeyStorageUnavailable)?;
        let key = MasterKey::generate();
        persist_new_key(&GuardPaths::key_file_in(dir), &key)
    }

    /// True if a key is available without generating one
    pub fn exists(&self) -> bool {
        !matches!(self.source(), KeySource::Missing)
    }

    /// Report where the key would be resolved from, without creating anything
    pub fn source(&self) -> KeySource {
        if self.override_value().is_some() {
            return KeySource::Override;
        }

        self.persisted_key()
            .map(KeySource::File)
            .unwrap_or(KeySource::Missing)
    }

    /// Directory holding the persisted key, if one exists
    pub fn location(&self) -> Option<PathBuf> {
        self.persisted_key()
            .and_then(|path| path.parent().map(Path::to_path_buf))
    }

    /// First key file in a writable candidate, in priority order
    fn persisted_key(&self) -> Option<PathBuf> {
        self.key_files()
            .find(|path| path.is_file() && path.parent().is_some_and(probe_writable))
    }

    fn key_files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.paths
            .key_dirs()
            .iter()
            .map(|dir| GuardPaths::key_file_in(dir))
    }

    fn override_value(&self) -> Option<Zeroizing<String>> {
        std::env::var(&self.override_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(Zeroizing::new)
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that a file can be written in an existing directory
fn probe_writable(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }

    let probe = dir.join(WRITE_PROBE_FILE);
    match fs::write(&probe, b"test") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "key directory not writable");
            false
        }
    }
}

/// Make a candidate ready to receive a new key, creating it if needed
///
/// A directory created here is removed again if it turns out unwritable.
fn prepare_dir(dir: &Path) -> bool {
    if dir.is_dir() {
        return probe_writable(dir);
    }

    if let Err(e) = create_private_dir(dir) {
        debug!(dir = %dir.display(), error = %e, "key directory not usable");
        return false;
    }
    if probe_writable(dir) {
        return true;
    }
    let _ = fs::remove_dir(dir);
    false
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    if dir.is_dir() {
        return Ok(());
    }
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

fn read_key_file(path: &Path) -> GuardResult<MasterKey> {
    let encoded = Zeroizing::new(fs::read_to_string(path).map_err(|e| {
        GuardError::Io(format!("Failed to read {}: {}", path.display(), e))
    })?);
    MasterKey::from_hex(&encoded)
}

/// Write a new key with owner-only permissions
///
/// If another process created the file first, its key wins and is returned.
fn persist_new_key(path: &Path, key: &MasterKey) -> GuardResult<MasterKey> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    match options.open(path) {
        Ok(mut file) => {
            let encoded = key.to_hex();
            file.write_all(encoded.as_bytes())
                .and_then(|()| file.sync_all())
                .map_err(|e| {
                    GuardError::Io(format!("Failed to write {}: {}", path.display(), e))
                })?;
            info!(path = %path.display(), "generated new master key");
            Ok(key.clone())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            warn!(path = %path.display(), "master key created concurrently, using existing key");
            read_key_file(path)
        }
        Err(e) => Err(GuardError::Io(format!(
            "Failed to create {}: {}",
            path.display(),
            e
        ))),
    }
}
