//! Env file processing
//!
//! - `line`: the line model shared by every operation
//! - `transform`: whole-file encrypt / decrypt / migrate
//! - `inject`: loading values into an environment sink
//! - `schema`: validation of the loaded environment

pub mod inject;
pub mod line;
pub mod schema;
pub mod transform;

pub use inject::{
    inject, load, load_into_environment, read_pairs, EnvironmentSink, MemoryEnv, ProcessEnv,
};
pub use line::{ConfigLine, EnvLine};
pub use schema::{Schema, SchemaRule, Violation};
pub use transform::{has_encrypted_values, has_legacy_values, EnvFileTransform, TransformReport};
