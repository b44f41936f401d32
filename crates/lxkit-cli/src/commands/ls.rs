//! `lxk ls` — List defined containers.

use clap::Args;
use lxkit_runtime::ContainerRegistry;

use crate::output::{self, ContainerRow};

/// Arguments for the `ls` command.
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Only show active containers.
    #[arg(short, long)]
    pub active: bool,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `ls` command.
///
/// # Errors
///
/// Returns an error if the config root cannot be enumerated.
pub fn execute(registry: &ContainerRegistry, args: &LsArgs) -> anyhow::Result<()> {
    let rows: Vec<ContainerRow> = registry
        .containers()?
        .iter()
        .map(ContainerRow::capture)
        .filter(|row| !args.active || row.state.is_active())
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("No containers found.");
    } else {
        print!("{}", output::render_table(&rows));
    }
    Ok(())
}
