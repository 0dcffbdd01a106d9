//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the library layer.

pub mod encrypt;
pub mod init;
pub mod key;
pub mod validate;

pub use encrypt::{
    handle_decrypt_command, handle_encrypt_command, handle_migrate_command, DecryptArgs,
    EncryptArgs, MigrateArgs,
};
pub use init::{handle_init_command, InitCommands};
pub use key::{handle_key_command, KeyCommands};
pub use validate::{handle_validate_command, ValidateArgs};

use crate::crypto::{KeyStore, LegacyCodec, ValueCodec};
use crate::error::GuardResult;

/// Codec over the resolved master key, with the legacy path if available
pub(crate) fn open_codec() -> GuardResult<ValueCodec> {
    let key = KeyStore::new().resolve()?;
    Ok(ValueCodec::with_legacy(key, LegacyCodec::detect()))
}
