//! Encrypt, decrypt and migrate commands

use std::path::PathBuf;

use clap::Args;

use crate::config::paths::{DEFAULT_ENV_FILE, DEFAULT_POLICY_FILE};
use crate::envfile::{has_legacy_values, EnvFileTransform, TransformReport};
use crate::error::GuardResult;
use crate::storage::{read_text_required, write_text_atomic};

use super::open_codec;

#[derive(Args, Debug)]
pub struct EncryptArgs {
    /// Env file to encrypt
    #[arg(default_value = DEFAULT_ENV_FILE)]
    pub file: PathBuf,

    /// Write the result here instead of overwriting the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Selective encryption policy
    #[arg(short, long, default_value = DEFAULT_POLICY_FILE)]
    pub policy: PathBuf,
}

#[derive(Args, Debug)]
pub struct DecryptArgs {
    /// Env file to decrypt
    #[arg(default_value = DEFAULT_ENV_FILE)]
    pub file: PathBuf,

    /// Write the plaintext back to the file instead of printing it
    #[arg(short, long)]
    pub write: bool,
}

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Env file holding legacy values
    #[arg(default_value = DEFAULT_ENV_FILE)]
    pub file: PathBuf,

    /// Selective encryption policy
    #[arg(short, long, default_value = DEFAULT_POLICY_FILE)]
    pub policy: PathBuf,
}

/// Handle `encrypt`
pub fn handle_encrypt_command(args: EncryptArgs) -> GuardResult<()> {
    let transform = EnvFileTransform::new(open_codec()?).with_policy_file(&args.policy);
    if transform.policy().is_some() {
        println!("Using policy {}", args.policy.display());
    }

    let output = args.output.as_ref().unwrap_or(&args.file);
    let report = transform.encrypt_file_to(&args.file, output)?;
    print_report("Encrypted", &report);
    Ok(())
}

/// Handle `decrypt`
pub fn handle_decrypt_command(args: DecryptArgs) -> GuardResult<()> {
    let transform = EnvFileTransform::new(open_codec()?);
    let plain = transform.decrypt_file(&args.file)?;

    if args.write {
        write_text_atomic(&args.file, &plain)?;
        println!("Decrypted {}", args.file.display());
    } else {
        print!("{}", plain);
    }
    Ok(())
}

/// Handle `migrate`
pub fn handle_migrate_command(args: MigrateArgs) -> GuardResult<()> {
    let content = read_text_required(&args.file)?;
    if !has_legacy_values(&content) {
        println!("No legacy values in {}", args.file.display());
        return Ok(());
    }

    let transform = EnvFileTransform::new(open_codec()?).with_policy_file(&args.policy);
    let report = transform.migrate_file(&args.file)?;
    print_report("Migrated", &report);
    Ok(())
}

fn print_report(action: &str, report: &TransformReport) {
    println!("{} {}", action, report.output.display());
    println!("  encrypted: {}", report.encrypted);
    println!("  plaintext: {}", report.plaintext);
    if report.migrated > 0 {
        println!("  migrated from legacy format: {}", report.migrated);
    }
}
