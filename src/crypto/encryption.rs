//! AES-256-GCM value encryption/decryption
//!
//! Each value is encrypted independently with a fresh 96-bit nonce and
//! rendered as `aes:<ivHex>:<tagHex>:<cipherHex>`. The tag is kept in its
//! own segment rather than appended to the ciphertext.

use aes_gcm::{
    aead::{rand_core::RngCore, AeadInPlace, KeyInit, OsRng},
    Aes256Gcm, Nonce, Tag,
};
use tracing::warn;

use crate::error::{GuardError, GuardResult};

use super::{LegacyCodec, MasterKey};

/// Tag prefix of the current format
pub const ENCRYPTED_PREFIX: &str = "aes";

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
const TAG_SIZE: usize = 16;

/// Hex length of a legacy CBC IV
const LEGACY_IV_HEX_LEN: usize = 32;

/// Structural classification of a stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// `aes:iv:tag:cipher`
    Current,
    /// `iv:cipher` from the keychain-era releases
    Legacy,
    /// Anything else
    Plain,
}

impl ValueFormat {
    /// Classify a value by its shape alone
    pub fn detect(value: &str) -> Self {
        if value.starts_with("aes:") {
            Self::Current
        } else if looks_legacy(value) {
            Self::Legacy
        } else {
            Self::Plain
        }
    }

    pub fn is_encrypted(self) -> bool {
        !matches!(self, Self::Plain)
    }
}

/// True iff the value carries the current format tag
pub fn is_encrypted(value: &str) -> bool {
    ValueFormat::detect(value) == ValueFormat::Current
}

/// True iff the value has the legacy `iv:cipher` shape
///
/// Exactly one `:`, a 32 hex char IV and a non-empty hex ciphertext. A
/// colon alone is not enough (`http://localhost:3000` is plain).
pub fn is_legacy_encrypted(value: &str) -> bool {
    ValueFormat::detect(value) == ValueFormat::Legacy
}

fn looks_legacy(value: &str) -> bool {
    let Some((iv, cipher)) = value.split_once(':') else {
        return false;
    };
    !cipher.contains(':')
        && iv.len() == LEGACY_IV_HEX_LEN
        && is_hex(iv)
        && !cipher.is_empty()
        && is_hex(cipher)
}

fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Encrypts and decrypts individual values with one master key
#[derive(Debug, Clone)]
pub struct ValueCodec {
    key: MasterKey,
    legacy: LegacyCodec,
}

impl ValueCodec {
    /// Codec without legacy support
    pub fn new(key: MasterKey) -> Self {
        Self::with_legacy(key, LegacyCodec::Unavailable)
    }

    /// Codec that can also read legacy values
    pub fn with_legacy(key: MasterKey, legacy: LegacyCodec) -> Self {
        Self { key, legacy }
    }

    pub fn legacy(&self) -> &LegacyCodec {
        &self.legacy
    }

    /// Encrypt a value into the tagged format
    ///
    /// Generates a random nonce for each call, so equal inputs produce
    /// different outputs.
    pub fn encrypt(&self, plaintext: &str) -> GuardResult<String> {
        let cipher = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(nonce, b"", &mut buffer)
            .map_err(|e| GuardError::Encryption(format!("Encryption failed: {}", e)))?;

        Ok(format!(
            "{}:{}:{}:{}",
            ENCRYPTED_PREFIX,
            hex::encode(nonce_bytes),
            hex::encode(tag),
            hex::encode(buffer)
        ))
    }

    /// Decrypt a value of any format
    ///
    /// Plain values are returned unchanged. Legacy values go through the
    /// legacy codec and fail loudly when it cannot read them.
    pub fn decrypt(&self, value: &str) -> GuardResult<String> {
        match ValueFormat::detect(value) {
            ValueFormat::Current => self.decrypt_current(value),
            ValueFormat::Legacy => {
                let plain = self.legacy.decrypt(value)?;
                warn!("decrypted a legacy-format value; run 'dotenv-guard migrate' to upgrade it");
                Ok(plain)
            }
            ValueFormat::Plain => Ok(value.to_string()),
        }
    }

    /// Decrypt, and re-encrypt in the current format if the input was legacy
    pub fn decrypt_and_migrate(&self, value: &str) -> GuardResult<(String, Option<String>)> {
        match ValueFormat::detect(value) {
            ValueFormat::Legacy => {
                let plain = self.legacy.decrypt(value)?;
                let migrated = self.encrypt(&plain)?;
                Ok((plain, Some(migrated)))
            }
            _ => Ok((self.decrypt(value)?, None)),
        }
    }

    fn decrypt_current(&self, value: &str) -> GuardResult<String> {
        let parts: Vec<&str> = value.split(':').collect();
        if parts.len() != 4 || parts[0] != ENCRYPTED_PREFIX {
            return Err(GuardError::InvalidEncryptedFormat(format!(
                "expected 4 segments, got {}",
                parts.len()
            )));
        }

        let nonce_bytes = decode_segment("iv", parts[1])?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(GuardError::InvalidEncryptedFormat(format!(
                "Invalid nonce size: expected {}, got {}",
                NONCE_SIZE,
                nonce_bytes.len()
            )));
        }
        let tag_bytes = decode_segment("auth tag", parts[2])?;
        if tag_bytes.len() != TAG_SIZE {
            return Err(GuardError::InvalidEncryptedFormat(format!(
                "Invalid auth tag size: expected {}, got {}",
                TAG_SIZE,
                tag_bytes.len()
            )));
        }
        let mut buffer = decode_segment("ciphertext", parts[3])?;

        let cipher = self.cipher()?;
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&nonce_bytes),
                b"",
                &mut buffer,
                Tag::from_slice(&tag_bytes),
            )
            .map_err(|_| GuardError::DecryptionAuthFailure)?;

        String::from_utf8(buffer).map_err(|e| {
            GuardError::Encryption(format!("Invalid UTF-8 in decrypted data: {}", e))
        })
    }

    fn cipher(&self) -> GuardResult<Aes256Gcm> {
        Aes256Gcm::new_from_slice(self.key.as_bytes())
            .map_err(|e| GuardError::Encryption(format!("Failed to create cipher: {}", e)))
    }
}

fn decode_segment(name: &str, segment: &str) -> GuardResult<Vec<u8>> {
    hex::decode(segment)
        .map_err(|e| GuardError::InvalidEncryptedFormat(format!("{} is not valid hex: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> ValueCodec {
        ValueCodec::new(MasterKey::generate())
    }

    /// Replace one hex digit of a segment with a different one
    fn flip_digit(value: &str, index: usize, pos: usize) -> String {
        let mut parts: Vec<String> = value.split(':').map(str::to_string).collect();
        let segment = &mut parts[index];
        let old = segment.remove(pos);
        segment.insert(pos, if old == '0' { '1' } else { '0' });
        parts.join(":")
    }

    fn assert_every_digit_authenticated(codec: &ValueCodec, encrypted: &str, index: usize) {
        let len = encrypted.split(':').nth(index).unwrap().len();
        for pos in 0..len {
            let tampered = flip_digit(encrypted, index, pos);
            assert!(
                matches!(codec.decrypt(&tampered), Err(GuardError::DecryptionAuthFailure)),
                "segment {index} digit {pos} was not authenticated"
            );
        }
    }

    #[test]
    fn test_encrypt_decrypt() {
        let codec = codec();
        for value in ["secret123", "postgresql://user:pw@localhost:5432/db", "", "ünïcødé ✓"] {
            let encrypted = codec.encrypt(value).unwrap();
            assert!(is_encrypted(&encrypted));
            assert_eq!(codec.decrypt(&encrypted).unwrap(), value);
        }
    }

    #[test]
    fn test_wire_format() {
        let encrypted = codec().encrypt("secret123").unwrap();
        let parts: Vec<&str> = encrypted.split(':').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "aes");
        assert_eq!(parts[1].len(), NONCE_SIZE * 2);
        assert_eq!(parts[2].len(), TAG_SIZE * 2);
        assert_eq!(parts[3].len(), "secret123".len() * 2);
    }

    #[test]
    fn test_different_nonces() {
        let codec = codec();
        let first = codec.encrypt("same").unwrap();
        let second = codec.encrypt("same").unwrap();

        assert_ne!(first, second);
        assert_eq!(codec.decrypt(&first).unwrap(), "same");
        assert_eq!(codec.decrypt(&second).unwrap(), "same");
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let codec = codec();
        let encrypted = codec.encrypt("secret123").unwrap();
        assert_every_digit_authenticated(&codec, &encrypted, 3);
    }

    #[test]
    fn test_tampered_tag_fails() {
        let codec = codec();
        let encrypted = codec.encrypt("secret123").unwrap();
        assert_every_digit_authenticated(&codec, &encrypted, 2);
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let codec = codec();
        let encrypted = codec.encrypt("secret123").unwrap();
        assert_every_digit_authenticated(&codec, &encrypted, 1);
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = codec().encrypt("secret123").unwrap();
        assert!(matches!(
            codec().decrypt(&encrypted),
            Err(GuardError::DecryptionAuthFailure)
        ));
    }

    #[test]
    fn test_malformed_tagged_values() {
        let codec = codec();
        for value in ["aes:ab:cd:ef", "aes:zz:zz:zz", "aes:only", "aes:a:b:c:d"] {
            assert!(
                matches!(codec.decrypt(value), Err(GuardError::InvalidEncryptedFormat(_))),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_plain_values_pass_through() {
        let codec = codec();
        for value in ["plaintext", "postgresql://localhost", "3000", "", "http://localhost:3000"] {
            assert_eq!(codec.decrypt(value).unwrap(), value);
        }
    }

    #[test]
    fn test_format_detection() {
        assert!(is_legacy_encrypted("0123456789abcdef0123456789abcdef:aa"));
        assert!(is_legacy_encrypted("A1B2C3D4E5F6A7B8C9D0E1F2A3B4C5D6:fedcba"));
        assert!(!is_legacy_encrypted("aes:ab:cd:ef"));
        assert!(!is_legacy_encrypted("http://localhost:3000"));
        assert!(!is_legacy_encrypted("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz:abcdef"));
        assert!(!is_legacy_encrypted("abc:def"));
        assert!(!is_legacy_encrypted("0123456789abcdef0123456789abcdef:"));
        assert!(!is_legacy_encrypted("0123456789abcdef0123456789abcdef:aa:bb"));
        assert!(!is_legacy_encrypted(""));

        assert_eq!(ValueFormat::detect("aes:abc123:def456:aaa789"), ValueFormat::Current);
        assert_eq!(ValueFormat::detect("plaintext-value"), ValueFormat::Plain);
        assert!(!is_encrypted("AES:ab:cd:ef"));
    }

    #[test]
    fn test_legacy_without_codec_is_refused() {
        let result = codec().decrypt("0123456789abcdef0123456789abcdef:aa");
        assert!(matches!(result, Err(GuardError::LegacyDependencyMissing)));
    }

    #[test]
    fn test_decrypt_and_migrate_legacy() {
        use cbc::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};

        let legacy_key = MasterKey::generate();
        let iv = [3u8; 16];
        let ciphertext = cbc::Encryptor::<aes::Aes256>::new_from_slices(legacy_key.as_bytes(), &iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(b"secret123");
        let legacy_value = format!("{}:{}", hex::encode(iv), hex::encode(ciphertext));

        let codec = ValueCodec::with_legacy(MasterKey::generate(), LegacyCodec::with_key(legacy_key));
        let (plain, migrated) = codec.decrypt_and_migrate(&legacy_value).unwrap();
        assert_eq!(plain, "secret123");

        let migrated = migrated.unwrap();
        assert!(is_encrypted(&migrated));
        assert_eq!(codec.decrypt(&migrated).unwrap(), "secret123");
    }

    #[test]
    fn test_decrypt_and_migrate_current_is_untouched() {
        let codec = codec();
        let encrypted = codec.encrypt("v").unwrap();
        let (plain, migrated) = codec.decrypt_and_migrate(&encrypted).unwrap();
        assert_eq!(plain, "v");
        assert!(migrated.is_none());
    }
}
