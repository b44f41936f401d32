//! `lxk config` — Read or edit a container's configuration.
//!
//! Edits are written back to the container's config file immediately.

use anyhow::Context;
use clap::{Args, Subcommand};
use lxkit_runtime::{Container, ContainerRegistry};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Container name.
    pub name: String,

    /// Action to perform.
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print every value of a key.
    Get {
        /// Dotted key, e.g. `lxc.network.0.link`.
        key: String,
    },
    /// Add a value to a key.
    Set {
        /// Dotted key.
        key: String,
        /// Value to store.
        value: String,
        /// Drop existing values first.
        #[arg(long)]
        replace: bool,
    },
    /// Remove a key and everything nested under it.
    Clear {
        /// Dotted key.
        key: String,
    },
    /// List the direct sub-keys of a prefix.
    Keys {
        /// Dotted prefix; empty lists the top level.
        #[arg(default_value = "")]
        prefix: String,
    },
}

fn persist(container: &Container) -> anyhow::Result<()> {
    let path = container.config_file_name();
    container
        .save_config_file(&path)
        .with_context(|| format!("saving {}", path.display()))
}

/// Executes the `config` command.
///
/// # Errors
///
/// Returns an error if the container is undefined or the file cannot be saved.
pub fn execute(registry: &ContainerRegistry, args: ConfigArgs) -> anyhow::Result<()> {
    let container = registry.acquire(&args.name);
    if !container.defined() {
        anyhow::bail!("container {} is not defined", args.name);
    }
    match args.action {
        ConfigAction::Get { key } => {
            for value in container.config_item(&key) {
                println!("{value}");
            }
        }
        ConfigAction::Set {
            key,
            value,
            replace,
        } => {
            if replace {
                container.clear_config_item(&key)?;
            }
            container.set_config_item(&key, &value)?;
            persist(&container)?;
            tracing::info!(name = %args.name, key, value, "config item set");
        }
        ConfigAction::Clear { key } => {
            container.clear_config_item(&key)?;
            persist(&container)?;
            tracing::info!(name = %args.name, key, "config item cleared");
        }
        ConfigAction::Keys { prefix } => {
            for key in container.keys(&prefix) {
                println!("{key}");
            }
        }
    }
    Ok(())
}
