//! Selective encryption policy
//!
//! Decides, per key, whether a value is stored encrypted or readable.

pub mod heuristics;
pub mod selective;

pub use heuristics::{classify, generate, KeyClass};
pub use selective::{should_encrypt, EncryptionPolicy};
