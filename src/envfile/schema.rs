//! Schema validation of a loaded environment
//!
//! `env.schema.json` maps each key to optional rules:
//!
//! ```json
//! { "PORT": { "required": true, "regex": "^[0-9]+$" },
//!   "NODE_ENV": { "enum": ["development", "production"] } }
//! ```
//!
//! Every key is checked and every violation is collected before failing,
//! so one run shows all of the problems.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{GuardError, GuardResult};
use crate::storage::{read_json_optional, read_text_required, write_json_atomic};

use super::inject::EnvironmentSink;
use super::line::assignments;

/// Rules for a single key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRule {
    /// Required unless explicitly `false`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl SchemaRule {
    pub fn is_required(&self) -> bool {
        self.required != Some(false)
    }
}

/// A rule that a key broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub key: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validation schema keyed by env variable name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    rules: BTreeMap<String, SchemaRule>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, rule: SchemaRule) {
        self.rules.insert(key.into(), rule);
    }

    pub fn rules(&self) -> &BTreeMap<String, SchemaRule> {
        &self.rules
    }

    /// Load a schema file; `None` if it does not exist
    pub fn load(path: impl AsRef<Path>) -> GuardResult<Option<Self>> {
        read_json_optional(path).map_err(|e| GuardError::Schema(e.to_string()))
    }

    /// Write the schema as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> GuardResult<()> {
        write_json_atomic(path, self)
    }

    /// Starter schema: every key of an env file, required, any value
    pub fn from_env_file(path: impl AsRef<Path>) -> GuardResult<Self> {
        let content = read_text_required(path)?;
        let mut schema = Self::new();
        for (key, _) in assignments(&content) {
            schema.insert(
                key,
                SchemaRule {
                    required: Some(true),
                    regex: Some(".*".to_string()),
                    allowed: None,
                },
            );
        }
        Ok(schema)
    }

    /// Check `env` against every rule
    pub fn validate<S: EnvironmentSink + ?Sized>(&self, env: &S) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (key, rule) in &self.rules {
            let value = env.get(key).filter(|v| !v.is_empty());

            let Some(value) = value else {
                if rule.is_required() {
                    violations.push(Violation {
                        key: key.clone(),
                        message: format!("Missing required env: {}", key),
                    });
                }
                continue;
            };

            if let Some(pattern) = &rule.regex {
                match Regex::new(pattern) {
                    Ok(re) if !re.is_match(&value) => violations.push(Violation {
                        key: key.clone(),
                        message: format!("Env {} does not match {}", key, pattern),
                    }),
                    Ok(_) => {}
                    Err(e) => violations.push(Violation {
                        key: key.clone(),
                        message: format!("Env {} has an invalid regex {}: {}", key, pattern, e),
                    }),
                }
            }

            if let Some(allowed) = &rule.allowed {
                if !allowed.iter().any(|a| *a == value) {
                    violations.push(Violation {
                        key: key.clone(),
                        message: format!("Env {} must be one of: {}", key, allowed.join(", ")),
                    });
                }
            }
        }

        violations
    }

    /// Validate and fail with every violation if any rule is broken
    pub fn enforce<S: EnvironmentSink + ?Sized>(&self, env: &S) -> GuardResult<()> {
        let violations = self.validate(env);
        if violations.is_empty() {
            return Ok(());
        }

        for v in &violations {
            error!(key = %v.key, "{}", v.message);
        }
        Err(GuardError::SchemaValidationFailed {
            violations: violations.into_iter().map(|v| v.message).collect(),
        })
    }
}
