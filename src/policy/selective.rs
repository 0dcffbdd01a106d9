//! Selective encryption policy
//!
//! `env.enc.json` names the keys that must be encrypted and the keys
//! that must stay readable:
//!
//! ```json
//! { "encrypt": ["DATABASE_URL", "API_KEY"], "plaintext": ["PORT"] }
//! ```
//!
//! The `plaintext` list always wins. No policy at all means every key is
//! encrypted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GuardError, GuardResult};
use crate::storage::write_json_atomic;

/// Which keys to encrypt and which to leave readable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionPolicy {
    #[serde(default)]
    pub encrypt: Vec<String>,
    #[serde(default)]
    pub plaintext: Vec<String>,
}

impl EncryptionPolicy {
    pub fn new(encrypt: Vec<String>, plaintext: Vec<String>) -> Self {
        Self { encrypt, plaintext }
    }

    /// Load a policy file
    ///
    /// Returns `None` when the file is absent. A malformed file is logged
    /// and also yields `None`, which means "encrypt everything".
    pub fn load(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no encryption policy");
            return None;
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(GuardError::from)
            .and_then(|content| Self::parse(&content));

        match parsed {
            Ok(policy) => {
                debug!(
                    path = %path.display(),
                    encrypt = policy.encrypt.len(),
                    plaintext = policy.plaintext.len(),
                    "loaded encryption policy"
                );
                Some(policy)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring encryption policy");
                None
            }
        }
    }

    /// Parse policy JSON
    ///
    /// At least one of `encrypt` / `plaintext` must be present. A field
    /// that is present but not an array counts as empty; non-string
    /// entries are dropped.
    pub fn parse(content: &str) -> GuardResult<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| GuardError::PolicyParse(format!("Failed to parse: {}", e)))?;

        let encrypt = value.get("encrypt").filter(|v| !v.is_null());
        let plaintext = value.get("plaintext").filter(|v| !v.is_null());
        if encrypt.is_none() && plaintext.is_none() {
            return Err(GuardError::PolicyParse(
                "missing \"encrypt\" or \"plaintext\" arrays".to_string(),
            ));
        }

        Ok(Self {
            encrypt: string_list(encrypt),
            plaintext: string_list(plaintext),
        })
    }

    /// Write the policy as pretty-printed JSON, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> GuardResult<()> {
        write_json_atomic(path, self)
    }

    /// Decide whether `key` should be encrypted under this policy
    pub fn should_encrypt(&self, key: &str) -> bool {
        if self.plaintext.iter().any(|k| k == key) {
            return false;
        }
        if !self.encrypt.is_empty() {
            return self.encrypt.iter().any(|k| k == key);
        }
        true
    }
}

/// Decide whether `key` should be encrypted, with or without a policy
pub fn should_encrypt(key: &str, policy: Option<&EncryptionPolicy>) -> bool {
    policy.map_or(true, |p| p.should_encrypt(key))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
