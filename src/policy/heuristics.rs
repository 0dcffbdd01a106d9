//! Policy generation from an existing env file
//!
//! Classifies each key by name. Well-known infrastructure names and
//! client-exposed prefixes stay plaintext; everything else, including
//! names that match no pattern at all, is encrypted.

use std::path::Path;
use std::sync::OnceLock;

use regex::RegexSet;
use tracing::debug;

use crate::envfile::line::assignments;
use crate::error::GuardResult;
use crate::storage::read_text_required;

use super::EncryptionPolicy;

/// Names that are safe to keep readable
const PUBLIC_PATTERNS: &[&str] = &[
    r"(?i)^port$",
    r"(?i)^host$",
    r"(?i)^node_env$",
    r"(?i)^env$",
    r"(?i)^log_level$",
    r"(?i)^debug$",
    r"(?i)^verbose$",
    // Bundler prefixes for values shipped to the browser anyway
    r"(?i)^vite_",
    r"(?i)^next_public_",
    r"(?i)^nuxt_public_",
];

/// Names that look like secrets
const SENSITIVE_PATTERNS: &[&str] = &[
    r"(?i)password",
    r"(?i)secret",
    r"(?i)key",
    r"(?i)token",
    r"(?i)auth",
    r"(?i)credential",
    r"(?i)private",
    r"(?i)database_url",
    r"(?i)db_",
];

/// Why a key ended up on its list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    Public,
    Sensitive,
    /// Matched nothing; encrypted to be safe
    Unknown,
}

impl KeyClass {
    pub fn encrypts(self) -> bool {
        !matches!(self, Self::Public)
    }
}

fn public_set() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| RegexSet::new(PUBLIC_PATTERNS).expect("public key patterns are valid"))
}

fn sensitive_set() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new(SENSITIVE_PATTERNS).expect("sensitive key patterns are valid")
    })
}

/// Classify a key name; public patterns are checked first
pub fn classify(key: &str) -> KeyClass {
    if public_set().is_match(key) {
        KeyClass::Public
    } else if sensitive_set().is_match(key) {
        KeyClass::Sensitive
    } else {
        KeyClass::Unknown
    }
}

/// Build a policy for every key in an env file
///
/// Keys keep their file order; duplicates are listed once.
pub fn generate(env_path: impl AsRef<Path>) -> GuardResult<EncryptionPolicy> {
    let content = read_text_required(env_path)?;
    Ok(generate_from_content(&content))
}

pub fn generate_from_content(content: &str) -> EncryptionPolicy {
    let mut policy = EncryptionPolicy::default();

    for (key, _) in assignments(content) {
        let class = classify(key);
        debug!(key, ?class, "classified key");

        let list = if class.encrypts() {
            &mut policy.encrypt
        } else {
            &mut policy.plaintext
        };
        if !list.iter().any(|k| k == key) {
            list.push(key.to_string());
        }
    }

    policy
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_classify() {
        assert_eq!(classify("PORT"), KeyClass::Public);
        assert_eq!(classify("node_env"), KeyClass::Public);
        assert_eq!(classify("VITE_API_URL"), KeyClass::Public);
        assert_eq!(classify("NEXT_PUBLIC_SITE"), KeyClass::Public);
        assert_eq!(classify("DB_PASSWORD"), KeyClass::Sensitive);
        assert_eq!(classify("JWT_SECRET"), KeyClass::Sensitive);
        assert_eq!(classify("DATABASE_URL"), KeyClass::Sensitive);
        assert_eq!(classify("GITHUB_TOKEN"), KeyClass::Sensitive);
        assert_eq!(classify("APP_NAME"), KeyClass::Unknown);
        // Exact names only; APP_PORT is not in the allow-list
        assert_eq!(classify("APP_PORT"), KeyClass::Unknown);
    }

    #[test]
    fn test_generate_from_content() {
        let content = "# app\nPORT=3000\nNODE_ENV=development\nDB_PASSWORD=pw\n\
                       API_KEY=k\nAPP_NAME=myapp\nVITE_TITLE=hi\nPORT=4000\n";
        let policy = generate_from_content(content);

        assert_eq!(policy.plaintext, vec!["PORT", "NODE_ENV", "VITE_TITLE"]);
        assert_eq!(policy.encrypt, vec!["DB_PASSWORD", "API_KEY", "APP_NAME"]);
    }

    #[test]
    fn test_generate_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = generate(temp_dir.path().join(".env")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_generate_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".env");
        fs::write(&path, "HOST=localhost\nSESSION_SECRET=s\n").unwrap();

        let policy = generate(&path).unwrap();
        assert_eq!(policy.plaintext, vec!["HOST"]);
        assert_eq!(policy.encrypt, vec!["SESSION_SECRET"]);
    }
}
