//! Schema validation command

use std::path::PathBuf;

use clap::Args;

use crate::config::paths::{DEFAULT_ENV_FILE, DEFAULT_SCHEMA_FILE};
use crate::envfile::{read_pairs, Schema};
use crate::error::{GuardError, GuardResult};

use super::open_codec;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Env file to validate
    #[arg(default_value = DEFAULT_ENV_FILE)]
    pub file: PathBuf,

    /// Schema to validate against
    #[arg(short, long, default_value = DEFAULT_SCHEMA_FILE)]
    pub schema: PathBuf,
}

/// Handle `validate`
///
/// The file is decrypted into an isolated map; neither the file nor the
/// process environment is touched.
pub fn handle_validate_command(args: ValidateArgs) -> GuardResult<()> {
    let schema = Schema::load(&args.schema)?.ok_or_else(|| GuardError::not_found(&args.schema))?;
    let env = read_pairs(&args.file, &open_codec()?)?;

    schema.enforce(&env)?;
    println!(
        "{} is valid ({} key(s) checked)",
        args.file.display(),
        schema.rules().len()
    );
    Ok(())
}
