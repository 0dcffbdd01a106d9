//! The 256-bit master key
//!
//! Stored and transported as 64 hex characters. The in-memory bytes are
//! zeroed when the key is dropped.

use std::fmt;

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{GuardError, GuardResult};

/// Key length in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// A symmetric master key
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; KEY_SIZE],
}

impl MasterKey {
    /// Generate a fresh key from the OS random source
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Wrap raw key bytes
    pub fn from_bytes(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Parse a hex-encoded key, ignoring surrounding whitespace
    pub fn from_hex(encoded: &str) -> GuardResult<Self> {
        let encoded = encoded.trim();
        if encoded.len() != KEY_SIZE * 2 {
            return Err(GuardError::InvalidMasterKey(format!(
                "expected {} hex characters, got {}",
                KEY_SIZE * 2,
                encoded.len()
            )));
        }

        let bytes = Zeroizing::new(
            hex::decode(encoded)
                .map_err(|e| GuardError::InvalidMasterKey(format!("not valid hex: {}", e)))?,
        );

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&bytes);
        Ok(Self { key })
    }

    /// Hex encoding suitable for the key file or the override variable
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.key))
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

// Never print key material
impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_random() {
        let a = MasterKey::generate();
        let b = MasterKey::generate();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_hex_roundtrip() {
        let key = MasterKey::generate();
        let encoded = key.to_hex();
        assert_eq!(encoded.len(), 64);
        let parsed = MasterKey::from_hex(&encoded).unwrap();
        assert_eq!(key.as_bytes(), parsed.as_bytes());
    }

    #[test]
    fn test_from_hex_trims_newline() {
        let encoded = format!("{}\n", "ab".repeat(32));
        let key = MasterKey::from_hex(&encoded).unwrap();
        assert_eq!(key.as_bytes(), &[0xab; 32]);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(matches!(
            MasterKey::from_hex("abcd"),
            Err(GuardError::InvalidMasterKey(_))
        ));
        assert!(matches!(
            MasterKey::from_hex(&"zz".repeat(32)),
            Err(GuardError::InvalidMasterKey(_))
        ));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = MasterKey::from_bytes([0x11; 32]);
        let debug = format!("{:?}", key);
        assert!(!debug.contains("1111"));
        assert!(debug.contains("REDACTED"));
    }
}
