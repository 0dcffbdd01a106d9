use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dotenv_guard::cli::{
    handle_decrypt_command, handle_encrypt_command, handle_init_command, handle_key_command,
    handle_migrate_command, handle_validate_command, DecryptArgs, EncryptArgs, InitCommands,
    KeyCommands, MigrateArgs, ValidateArgs,
};

const LOG_ENV: &str = "DOTENV_GUARD_LOG";

#[derive(Parser)]
#[command(
    name = "dotenv-guard",
    version,
    about = "Encrypted .env files with selective encryption",
    long_about = "dotenv-guard keeps .env files encrypted at rest. Each value is sealed \
                  with AES-256-GCM under a per-machine master key, while keys listed as \
                  plaintext in env.enc.json stay readable."
)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt an env file in place (or to --output)
    Encrypt(EncryptArgs),

    /// Decrypt an env file to stdout (or back to the file with --write)
    Decrypt(DecryptArgs),

    /// Convert legacy encrypted values to the current format
    Migrate(MigrateArgs),

    /// Generate starter schema or policy files
    #[command(subcommand)]
    Init(InitCommands),

    /// Validate an env file against a schema
    Validate(ValidateArgs),

    /// Master key management
    #[command(subcommand)]
    Key(KeyCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Encrypt(args) => handle_encrypt_command(args)?,
        Commands::Decrypt(args) => handle_decrypt_command(args)?,
        Commands::Migrate(args) => handle_migrate_command(args)?,
        Commands::Init(cmd) => handle_init_command(cmd)?,
        Commands::Validate(args) => handle_validate_command(args)?,
        Commands::Key(cmd) => handle_key_command(cmd)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
