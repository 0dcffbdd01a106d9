//! Master key commands

use clap::Subcommand;

use crate::config::paths::MASTER_KEY_ENV;
use crate::crypto::{KeySource, KeyStore};
use crate::error::GuardResult;

#[derive(Subcommand, Debug)]
pub enum KeyCommands {
    /// Show where the master key comes from
    Status,

    /// Provision the master key if it does not exist yet
    Init,
}

/// Handle `key` commands
pub fn handle_key_command(cmd: KeyCommands) -> GuardResult<()> {
    let store = KeyStore::new();
    match cmd {
        KeyCommands::Status => show_status(&store),
        KeyCommands::Init => {
            if store.exists() {
                println!("Master key already available.");
                return show_status(&store);
            }
            store.resolve()?;
            println!("Master key created.");
            show_status(&store)
        }
    }
}

fn show_status(store: &KeyStore) -> GuardResult<()> {
    match store.source() {
        KeySource::Override => println!("Master key: from {}", MASTER_KEY_ENV),
        KeySource::File(path) => println!("Master key: {}", path.display()),
        KeySource::Missing => {
            println!("Master key: not created yet");
            println!("Run 'dotenv-guard key init' or set {}.", MASTER_KEY_ENV);
        }
    }
    if let Some(dir) = store.location() {
        println!("Key directory: {}", dir.display());
    }
    Ok(())
}
