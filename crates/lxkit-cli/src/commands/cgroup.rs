//! `lxk cgroup` — Read or write a running container's cgroup files.

use clap::{Args, Subcommand};
use lxkit_runtime::ContainerRegistry;

/// Arguments for the `cgroup` command.
#[derive(Args, Debug)]
pub struct CgroupArgs {
    /// Container name.
    pub name: String,

    /// Action to perform.
    #[command(subcommand)]
    pub action: CgroupAction,
}

/// Cgroup actions.
#[derive(Subcommand, Debug)]
pub enum CgroupAction {
    /// Print a control file, e.g. `memory.usage_in_bytes`.
    Get {
        /// Control file name.
        key: String,
    },
    /// Write a control file, e.g. `memory.limit_in_bytes`.
    Set {
        /// Control file name.
        key: String,
        /// Value to write.
        value: String,
    },
}

/// Executes the `cgroup` command.
///
/// # Errors
///
/// Returns an error if the container is not running or the file is
/// unreadable or read-only.
pub fn execute(registry: &ContainerRegistry, args: CgroupArgs) -> anyhow::Result<()> {
    let container = registry.acquire(&args.name);
    match args.action {
        CgroupAction::Get { key } => {
            for line in container.cgroup_item(&key)? {
                println!("{line}");
            }
        }
        CgroupAction::Set { key, value } => {
            container.set_cgroup_item(&key, &value)?;
            println!("{key} = {value}");
        }
    }
    Ok(())
}
