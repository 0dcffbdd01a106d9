//! dotenv-guard - encrypted `.env` files with selective encryption
//!
//! This library keeps env files encrypted at rest and transparently
//! decrypts them when they are loaded into an application's environment.
//! Each value is sealed individually with AES-256-GCM under a per-machine
//! master key, so comments, blank lines and readable keys stay diffable.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path constants and load options
//! - `error`: Custom error types
//! - `crypto`: Master key storage and the value codec (current and legacy formats)
//! - `policy`: Selective encryption policy and its heuristic generator
//! - `envfile`: Line model, file transforms, environment injection, schema validation
//! - `storage`: Atomic file I/O
//! - `cli`: Command handlers for the `dotenv-guard` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use dotenv_guard::{load, LoadOptions, ProcessEnv};
//!
//! let options = LoadOptions::new().validate_with("env.schema.json");
//! load(&options, &mut ProcessEnv)?;
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod envfile;
pub mod error;
pub mod policy;
pub mod storage;

pub use config::{EncryptionMode, GuardPaths, LoadOptions};
pub use crypto::{KeyStore, MasterKey, ValueCodec};
pub use envfile::{
    load, EnvFileTransform, EnvironmentSink, MemoryEnv, ProcessEnv, Schema, TransformReport,
};
pub use error::{GuardError, GuardResult};
pub use policy::EncryptionPolicy;
