//! Storage layer for dotenv-guard
//!
//! Whole-file reads and atomic whole-file writes for env, policy and
//! schema files.

pub mod file_io;

pub use file_io::{read_json_optional, read_text_required, write_json_atomic, write_text_atomic};
