//! Starter file generation

use std::path::PathBuf;

use clap::Subcommand;

use crate::config::paths::{DEFAULT_ENV_FILE, DEFAULT_POLICY_FILE, DEFAULT_SCHEMA_FILE};
use crate::envfile::Schema;
use crate::error::GuardResult;
use crate::policy;

#[derive(Subcommand, Debug)]
pub enum InitCommands {
    /// Generate env.schema.json from the keys of an env file
    Schema {
        /// Env file to read keys from
        #[arg(default_value = DEFAULT_ENV_FILE)]
        file: PathBuf,

        /// Schema file to write
        #[arg(short, long, default_value = DEFAULT_SCHEMA_FILE)]
        output: PathBuf,

        /// Overwrite an existing schema
        #[arg(short, long)]
        force: bool,
    },

    /// Generate a selective encryption policy from key names
    Policy {
        /// Env file to read keys from
        #[arg(default_value = DEFAULT_ENV_FILE)]
        file: PathBuf,

        /// Policy file to write
        #[arg(short, long, default_value = DEFAULT_POLICY_FILE)]
        output: PathBuf,
    },
}

/// Handle `init` commands
pub fn handle_init_command(cmd: InitCommands) -> GuardResult<()> {
    match cmd {
        InitCommands::Schema {
            file,
            output,
            force,
        } => {
            if output.exists() && !force {
                println!(
                    "{} already exists, skipping. Use --force to overwrite.",
                    output.display()
                );
                return Ok(());
            }

            let schema = Schema::from_env_file(&file)?;
            schema.save(&output)?;
            println!(
                "Wrote {} with {} key(s)",
                output.display(),
                schema.rules().len()
            );
        }
        InitCommands::Policy { file, output } => {
            let policy = policy::generate(&file)?;
            policy.save(&output)?;
            println!("Wrote {}", output.display());
            println!("  encrypt:   {}", policy.encrypt.join(", "));
            println!("  plaintext: {}", policy.plaintext.join(", "));
        }
    }
    Ok(())
}
