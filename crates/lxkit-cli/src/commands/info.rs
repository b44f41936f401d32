//! `lxk info` — Show one container.

use clap::Args;
use lxkit_runtime::ContainerRegistry;

use crate::output::{self, ContainerRow};

/// Arguments for the `info` command.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Container name.
    pub name: String,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `info` command.
///
/// # Errors
///
/// Returns an error if the container is not defined.
pub fn execute(registry: &ContainerRegistry, args: &InfoArgs) -> anyhow::Result<()> {
    let container = registry.acquire(&args.name);
    if !container.defined() {
        anyhow::bail!("container {} is not defined", args.name);
    }
    let row = ContainerRow::capture(&container);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&row)?);
    } else {
        print!("{}", output::render_details(&row));
        println!("Config:      {}", container.config_file_name().display());
    }
    Ok(())
}
