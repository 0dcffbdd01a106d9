//! Injecting env file values into an environment
//!
//! The process environment is reached through [`EnvironmentSink`], so
//! callers (and tests) can load into an isolated map instead.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, warn};

use crate::config::{EncryptionMode, LoadOptions};
use crate::crypto::{KeyStore, LegacyCodec, ValueCodec};
use crate::error::GuardResult;
use crate::storage::{read_text_required, write_text_atomic};

use super::line;
use super::schema::Schema;
use super::transform::{has_encrypted_values, EnvFileTransform};

/// A writable key/value environment
pub trait EnvironmentSink {
    fn set(&mut self, key: &str, value: &str);
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvironmentSink for ProcessEnv {
    fn set(&mut self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// An isolated in-memory environment
pub type MemoryEnv = BTreeMap<String, String>;

impl EnvironmentSink for BTreeMap<String, String> {
    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }

    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

impl EnvironmentSink for HashMap<String, String> {
    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }

    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Write every assignment of `content` into `sink`, decrypting as needed
///
/// Lines are applied in order, so a later duplicate key overrides an
/// earlier one. Returns the number of assignments applied.
pub fn inject<S: EnvironmentSink + ?Sized>(
    content: &str,
    codec: &ValueCodec,
    sink: &mut S,
) -> GuardResult<usize> {
    let mut applied = 0;
    for (key, value) in line::assignments(content) {
        let plain = codec.decrypt(value)?;
        sink.set(key, &plain);
        applied += 1;
    }
    Ok(applied)
}

/// Bring a file to the desired at-rest state, then inject it
///
/// - `Encrypted`: encrypt per policy and write back, then inject the
///   decrypted values.
/// - `Plaintext`: if the file holds encrypted values, decrypt and write it
///   back as plaintext first; otherwise inject it untouched.
pub fn load_into_environment<S: EnvironmentSink + ?Sized>(
    path: impl AsRef<Path>,
    mode: EncryptionMode,
    transform: &EnvFileTransform,
    sink: &mut S,
) -> GuardResult<usize> {
    let path = path.as_ref();

    let content = match mode {
        EncryptionMode::Encrypted => {
            transform.encrypt_file(path)?;
            read_text_required(path)?
        }
        EncryptionMode::Plaintext => {
            let content = read_text_required(path)?;
            if has_encrypted_values(&content) {
                let plain = transform.decrypt_content(&content)?;
                write_text_atomic(path, &plain)?;
                debug!(file = %path.display(), "rewrote env file as plaintext");
                plain
            } else {
                content
            }
        }
    };

    let applied = inject(&content, transform.codec(), sink)?;
    debug!(file = %path.display(), applied, "injected env file");
    Ok(applied)
}

/// Load an env file the way a host application would at startup
///
/// Resolves the master key, brings the file to the requested state,
/// injects it into `sink` and, if asked, validates the result. Every
/// schema violation is reported at once.
pub fn load<S: EnvironmentSink + ?Sized>(options: &LoadOptions, sink: &mut S) -> GuardResult<()> {
    let key = KeyStore::new().resolve()?;
    let codec = ValueCodec::with_legacy(key, LegacyCodec::detect());
    let transform = EnvFileTransform::new(codec).with_policy_file(&options.policy);

    load_into_environment(&options.path, options.mode, &transform, sink)?;

    if options.validate {
        match Schema::load(&options.schema)? {
            Some(schema) => schema.enforce(sink)?,
            None => warn!(
                schema = %options.schema.display(),
                "validation enabled but schema file not found"
            ),
        }
    }

    Ok(())
}

/// Decrypted `(key, value)` pairs of a file, last duplicate winning
pub fn read_pairs(path: impl AsRef<Path>, codec: &ValueCodec) -> GuardResult<MemoryEnv> {
    let content = read_text_required(path)?;
    let mut env = MemoryEnv::new();
    inject(&content, codec, &mut env)?;
    Ok(env)
}
