//! Cryptographic functions for dotenv-guard
//!
//! Provides AES-256-GCM value encryption under a locally persisted
//! master key, plus read-only handling of the legacy CBC format.

pub mod encryption;
pub mod key_store;
pub mod legacy;
pub mod master_key;

pub use encryption::{is_encrypted, is_legacy_encrypted, ValueCodec, ValueFormat};
pub use key_store::{KeySource, KeyStore};
pub use legacy::LegacyCodec;
pub use master_key::MasterKey;
