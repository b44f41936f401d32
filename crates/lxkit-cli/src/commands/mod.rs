//! CLI command definitions and dispatch.

pub mod cgroup;
pub mod config;
pub mod info;
pub mod lifecycle;
pub mod ls;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lxkit_common::config::RuntimeConfig;
use lxkit_common::constants::CONFIG_PATH_ENV;
use lxkit_runtime::ContainerRegistry;

/// lxk — manage LXC containers.
#[derive(Parser, Debug)]
#[command(name = "lxk", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Root under which containers live.
    #[arg(long, global = true, env = CONFIG_PATH_ENV)]
    pub config_path: Option<PathBuf>,

    /// Runtime settings file (JSON).
    #[arg(long, global = true)]
    pub runtime_config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List defined containers.
    Ls(ls::LsArgs),
    /// Show state, PID, and memory accounting of a container.
    Info(info::InfoArgs),
    /// Create a container from the download template.
    Create(lifecycle::CreateArgs),
    /// Start a stopped container.
    Start(lifecycle::StartArgs),
    /// Kill a container and wait until it is stopped.
    Stop(lifecycle::NameArgs),
    /// Ask a container to shut down cleanly.
    Shutdown(lifecycle::ShutdownArgs),
    /// Suspend every process in a container.
    Freeze(lifecycle::WaitedArgs),
    /// Resume a frozen container.
    Unfreeze(lifecycle::WaitedArgs),
    /// Restart a running container's init.
    Reboot(lifecycle::WaitedArgs),
    /// Wait for a container to reach a state.
    Wait(lifecycle::WaitArgs),
    /// Copy a container under a new name.
    Clone(lifecycle::CloneArgs),
    /// Remove a stopped container.
    Destroy(lifecycle::NameArgs),
    /// Read or edit a container's configuration.
    Config(config::ConfigArgs),
    /// Read or write a running container's cgroup files.
    Cgroup(cgroup::CgroupArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the engine is unavailable or the command fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let registry = open_registry(&cli)?;
    let result = match cli.command {
        Command::Ls(args) => ls::execute(&registry, &args),
        Command::Info(args) => info::execute(&registry, &args),
        Command::Create(args) => lifecycle::create(&registry, &args),
        Command::Start(args) => lifecycle::start(&registry, &args),
        Command::Stop(args) => lifecycle::stop(&registry, &args),
        Command::Shutdown(args) => lifecycle::shutdown(&registry, &args),
        Command::Freeze(args) => lifecycle::freeze(&registry, &args),
        Command::Unfreeze(args) => lifecycle::unfreeze(&registry, &args),
        Command::Reboot(args) => lifecycle::reboot(&registry, &args),
        Command::Wait(args) => lifecycle::wait(&registry, &args),
        Command::Clone(args) => lifecycle::clone(&registry, &args),
        Command::Destroy(args) => lifecycle::destroy(&registry, &args),
        Command::Config(args) => config::execute(&registry, args),
        Command::Cgroup(args) => cgroup::execute(&registry, args),
    };
    registry.shutdown()?;
    result
}

/// Builds the registry from the environment and global flags.
fn open_registry(cli: &Cli) -> anyhow::Result<ContainerRegistry> {
    let mut config = match &cli.runtime_config {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("loading runtime config {}", path.display()))?,
        None => RuntimeConfig::from_env(),
    };
    if let Some(path) = &cli.config_path {
        config.config_path.clone_from(path);
    }
    tracing::debug!(config_path = %config.config_path.display(), "opening registry");
    ContainerRegistry::detect(config).context("no container engine available")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_config_path_after_subcommand() {
        let cli = Cli::try_parse_from(["lxk", "ls", "--config-path", "/srv/lxc"]).unwrap();
        assert_eq!(cli.config_path, Some(PathBuf::from("/srv/lxc")));
        assert!(matches!(cli.command, Command::Ls(_)));
    }

    #[test]
    fn parses_nested_config_subcommand() {
        let cli =
            Cli::try_parse_from(["lxk", "config", "web", "set", "lxc.start.auto", "1"]).unwrap();
        let Command::Config(args) = cli.command else {
            panic!("expected config command");
        };
        assert_eq!(args.name, "web");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
