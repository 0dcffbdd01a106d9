//! Whole-file encryption and decryption
//!
//! Files are read whole, transformed line by line and written back
//! atomically. Comments, blank lines, lines without `=` and untouched
//! assignments are emitted byte-for-byte. The first value that fails to
//! decrypt aborts the whole transform before anything is written.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::crypto::{ValueCodec, ValueFormat};
use crate::error::{GuardError, GuardResult};
use crate::policy::{should_encrypt, EncryptionPolicy};
use crate::storage::{read_text_required, write_text_atomic};

use super::line::{self, ConfigLine};

/// Counts reported by [`EnvFileTransform::encrypt_file`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// File that was written
    pub output: PathBuf,
    /// Keys stored encrypted (including ones that already were)
    pub encrypted: usize,
    /// Keys stored readable
    pub plaintext: usize,
    /// Legacy values converted along the way
    pub migrated: usize,
}

#[derive(Debug, Default)]
struct Counts {
    encrypted: usize,
    plaintext: usize,
    migrated: usize,
}

/// Applies a [`ValueCodec`] and an optional policy to env files
#[derive(Debug, Clone)]
pub struct EnvFileTransform {
    codec: ValueCodec,
    policy: Option<EncryptionPolicy>,
}

impl EnvFileTransform {
    /// Transform that encrypts every key
    pub fn new(codec: ValueCodec) -> Self {
        Self {
            codec,
            policy: None,
        }
    }

    pub fn with_policy(mut self, policy: Option<EncryptionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Load the policy from a file; absent or malformed means no policy
    pub fn with_policy_file(self, path: impl AsRef<Path>) -> Self {
        self.with_policy(EncryptionPolicy::load(path))
    }

    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    pub fn policy(&self) -> Option<&EncryptionPolicy> {
        self.policy.as_ref()
    }

    /// Encrypt a file in place
    pub fn encrypt_file(&self, path: impl AsRef<Path>) -> GuardResult<TransformReport> {
        let path = path.as_ref();
        self.encrypt_file_to(path, path)
    }

    /// Encrypt `path` and write the result to `output`
    pub fn encrypt_file_to(
        &self,
        path: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> GuardResult<TransformReport> {
        let (path, output) = (path.as_ref(), output.as_ref());
        let content = read_text_required(path)?;

        let (transformed, counts) = self.encrypt_content_counted(&content)?;
        write_text_atomic(output, &transformed)?;

        info!(
            file = %output.display(),
            encrypted = counts.encrypted,
            plaintext = counts.plaintext,
            migrated = counts.migrated,
            "encrypted env file"
        );

        Ok(TransformReport {
            output: output.to_path_buf(),
            encrypted: counts.encrypted,
            plaintext: counts.plaintext,
            migrated: counts.migrated,
        })
    }

    /// Encrypt file content per policy
    ///
    /// Values already in the current format are left as they are. Legacy
    /// values are decrypted through the legacy codec first and never
    /// mistaken for plaintext.
    pub fn encrypt_content(&self, content: &str) -> GuardResult<String> {
        self.encrypt_content_counted(content).map(|(out, _)| out)
    }

    fn encrypt_content_counted(&self, content: &str) -> GuardResult<(String, Counts)> {
        let mut out = String::with_capacity(content.len() * 2);
        let mut counts = Counts::default();

        for line in line::parse(content) {
            let ConfigLine::Assignment { key, value } = line.kind else {
                push_line(&mut out, line.text, line.ending);
                continue;
            };

            let encrypt = should_encrypt(key, self.policy());
            match ValueFormat::detect(value) {
                ValueFormat::Current => {
                    counts.encrypted += 1;
                    push_line(&mut out, line.text, line.ending);
                }
                ValueFormat::Legacy => {
                    let (plain, migrated) = self.codec.decrypt_and_migrate(value)?;
                    counts.migrated += 1;
                    if encrypt {
                        counts.encrypted += 1;
                        let migrated = match migrated {
                            Some(v) => v,
                            None => self.codec.encrypt(&plain)?,
                        };
                        push_assignment(&mut out, key, &migrated, line.ending);
                    } else {
                        counts.plaintext += 1;
                        push_assignment(&mut out, key, &plain, line.ending);
                    }
                }
                ValueFormat::Plain if encrypt => {
                    counts.encrypted += 1;
                    let encrypted = self.codec.encrypt(value)?;
                    push_assignment(&mut out, key, &encrypted, line.ending);
                }
                ValueFormat::Plain => {
                    counts.plaintext += 1;
                    push_line(&mut out, line.text, line.ending);
                }
            }
        }

        Ok((out, counts))
    }

    /// Decrypt a file and return its plaintext content
    ///
    /// Nothing is written; persisting the result is up to the caller.
    pub fn decrypt_file(&self, path: impl AsRef<Path>) -> GuardResult<String> {
        let content = read_text_required(path)?;
        self.decrypt_content(&content)
    }

    /// Decrypt every encrypted value (current or legacy) in file content
    pub fn decrypt_content(&self, content: &str) -> GuardResult<String> {
        let mut out = String::with_capacity(content.len());

        for line in line::parse(content) {
            match line.kind {
                ConfigLine::Assignment { key, value }
                    if ValueFormat::detect(value).is_encrypted() =>
                {
                    let plain = self.codec.decrypt(value)?;
                    push_assignment(&mut out, key, &plain, line.ending);
                }
                _ => push_line(&mut out, line.text, line.ending),
            }
        }

        Ok(out)
    }

    /// Encrypt a file in place, upgrading its legacy values
    ///
    /// Same result as [`encrypt_file`](Self::encrypt_file), but legacy
    /// values are a precondition: without a usable legacy codec the file
    /// is left untouched and `LegacyDependencyMissing` is returned up front.
    pub fn migrate_file(&self, path: impl AsRef<Path>) -> GuardResult<TransformReport> {
        let path = path.as_ref();
        let content = read_text_required(path)?;

        if has_legacy_values(&content) && !self.codec.legacy().is_available() {
            return Err(GuardError::LegacyDependencyMissing);
        }

        let report = self.encrypt_file(path)?;
        info!(file = %path.display(), migrated = report.migrated, "migrated env file");
        Ok(report)
    }
}

/// True if any assignment holds an encrypted value (current or legacy)
pub fn has_encrypted_values(content: &str) -> bool {
    line::assignments(content).any(|(_, value)| ValueFormat::detect(value).is_encrypted())
}

/// True if any assignment holds a legacy `iv:cipher` value
pub fn has_legacy_values(content: &str) -> bool {
    line::assignments(content).any(|(_, value)| ValueFormat::detect(value) == ValueFormat::Legacy)
}

fn push_line(out: &mut String, text: &str, ending: &str) {
    out.push_str(text);
    out.push_str(ending);
}

fn push_assignment(out: &mut String, key: &str, value: &str, ending: &str) {
    out.push_str(key);
    out.push('=');
    out.push_str(value);
    out.push_str(ending);
}
