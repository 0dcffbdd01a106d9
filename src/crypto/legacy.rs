//! Read-only support for the pre-GCM value format
//!
//! Older releases wrote `ivHex:cipherHex` values using AES-256-CBC with a
//! key kept in the OS keychain. Those values carry no authentication tag
//! and are never produced anymore; they can only be decrypted so they can
//! be migrated.
//!
//! Whether the keychain path exists is decided once, by
//! [`LegacyCodec::detect`], and the result is passed around explicitly.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use tracing::debug;

use crate::error::{GuardError, GuardResult};

use super::MasterKey;

type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Keychain service the legacy key was stored under
pub const LEGACY_SERVICE: &str = "dotenv-guard";

/// Keychain account the legacy key was stored under
pub const LEGACY_ACCOUNT: &str = "default";

/// Legacy IV length in bytes (CBC block size)
pub const LEGACY_IV_SIZE: usize = 16;

/// The legacy decryption capability
#[derive(Debug, Clone, Default)]
pub enum LegacyCodec {
    /// The old key was found; legacy values can be decrypted
    Available(MasterKey),
    /// No way to read legacy values in this process
    #[default]
    Unavailable,
}

impl LegacyCodec {
    /// Resolve the capability for this process from the OS keychain
    #[cfg(feature = "legacy-keychain")]
    pub fn detect() -> Self {
        keychain::load()
    }

    /// Resolve the capability for this process
    #[cfg(not(feature = "legacy-keychain"))]
    pub fn detect() -> Self {
        debug!("built without legacy-keychain support");
        Self::Unavailable
    }

    /// Use a known legacy key (for tests and offline migration)
    pub fn with_key(key: MasterKey) -> Self {
        Self::Available(key)
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Decrypt a value already known to be in the legacy layout
    pub fn decrypt(&self, value: &str) -> GuardResult<String> {
        let key = match self {
            Self::Available(key) => key,
            Self::Unavailable => return Err(GuardError::LegacyDependencyMissing),
        };

        let (iv_hex, cipher_hex) = value
            .split_once(':')
            .ok_or(GuardError::LegacyFormatDetected)?;
        let iv = hex::decode(iv_hex).map_err(|_| GuardError::LegacyFormatDetected)?;
        let ciphertext = hex::decode(cipher_hex).map_err(|_| GuardError::LegacyFormatDetected)?;
        if iv.len() != LEGACY_IV_SIZE {
            return Err(GuardError::LegacyFormatDetected);
        }

        let decryptor = Aes256CbcDec::new_from_slices(key.as_bytes(), &iv)
            .map_err(|e| GuardError::Encryption(format!("Failed to create cipher: {}", e)))?;
        let plaintext = decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| {
                debug!("legacy value did not unpad; wrong key or corrupt data");
                GuardError::LegacyFormatDetected
            })?;

        String::from_utf8(plaintext).map_err(|_| GuardError::LegacyFormatDetected)
    }
}

#[cfg(feature = "legacy-keychain")]
mod keychain {
    use tracing::{debug, warn};

    use super::{LegacyCodec, LEGACY_ACCOUNT, LEGACY_SERVICE};
    use crate::crypto::MasterKey;

    pub(super) fn load() -> LegacyCodec {
        let entry = match keyring::Entry::new(LEGACY_SERVICE, LEGACY_ACCOUNT) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "keychain not accessible");
                return LegacyCodec::Unavailable;
            }
        };

        match entry.get_password() {
            Ok(encoded) => match MasterKey::from_hex(&encoded) {
                Ok(key) => LegacyCodec::Available(key),
                Err(e) => {
                    warn!(error = %e, "legacy keychain entry is not a valid key");
                    LegacyCodec::Unavailable
                }
            },
            Err(keyring::Error::NoEntry) => {
                debug!("no legacy key in keychain");
                LegacyCodec::Unavailable
            }
            Err(e) => {
                warn!(error = %e, "failed to read legacy key from keychain");
                LegacyCodec::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbc::cipher::BlockEncryptMut;

    type Aes256CbcEnc = cbc::Encryptor<Aes256>;

    /// Produce a value the way old releases did
    fn legacy_encrypt(plaintext: &str, key: &MasterKey, iv: [u8; 16]) -> String {
        let ciphertext = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        format!("{}:{}", hex::encode(iv), hex::encode(ciphertext))
    }

    #[test]
    fn test_decrypts_legacy_value() {
        let key = MasterKey::generate();
        let value = legacy_encrypt("postgresql://localhost/app", &key, [7u8; 16]);

        let codec = LegacyCodec::with_key(key);
        assert_eq!(codec.decrypt(&value).unwrap(), "postgresql://localhost/app");
    }

    #[test]
    fn test_unavailable_reports_missing_dependency() {
        let codec = LegacyCodec::Unavailable;
        let result = codec.decrypt("0123456789abcdef0123456789abcdef:aa");
        assert!(matches!(result, Err(GuardError::LegacyDependencyMissing)));
    }

    #[test]
    fn test_wrong_key_asks_for_migration() {
        let value = legacy_encrypt("secret", &MasterKey::generate(), [1u8; 16]);
        let codec = LegacyCodec::with_key(MasterKey::generate());

        // A wrong key almost always breaks the padding; if it happens to
        // unpad, the bytes are garbage and fail UTF-8 or compare unequal.
        match codec.decrypt(&value) {
            Err(GuardError::LegacyFormatDetected) => {}
            Ok(plain) => assert_ne!(plain, "secret"),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_ciphertext_is_rejected() {
        let codec = LegacyCodec::with_key(MasterKey::generate());
        assert!(matches!(
            codec.decrypt("0123456789abcdef0123456789abcdef:aa"),
            Err(GuardError::LegacyFormatDetected)
        ));
    }
}
