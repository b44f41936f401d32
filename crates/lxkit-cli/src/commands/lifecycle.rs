//! `lxk create|start|stop|shutdown|freeze|unfreeze|reboot|wait|clone|destroy`.

use std::time::Duration;

use clap::Args;
use lxkit_common::types::{CloneBackend, ContainerState};
use lxkit_runtime::engine::CreateRequest;
use lxkit_runtime::{Container, ContainerRegistry};

/// Arguments naming a single container.
#[derive(Args, Debug)]
pub struct NameArgs {
    /// Container name.
    pub name: String,
}

/// Arguments for the `create` command.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Container name.
    pub name: String,

    /// Distribution to download.
    #[arg(short, long, default_value = "ubuntu")]
    pub distro: String,

    /// Release of the distribution.
    #[arg(short, long, default_value = "jammy")]
    pub release: String,

    /// Architecture.
    #[arg(short, long, default_value = "amd64")]
    pub arch: String,

    /// Template to run.
    #[arg(short, long, default_value = "download")]
    pub template: String,
}

/// Arguments for the `start` command.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Container name.
    pub name: String,

    /// Run `/sbin/init` through the application launcher.
    #[arg(long)]
    pub init: bool,

    /// Stay attached until init exits.
    #[arg(short = 'F', long)]
    pub foreground: bool,

    /// Seconds to wait for the container to report RUNNING.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

/// Arguments for the `shutdown` command.
#[derive(Args, Debug)]
pub struct ShutdownArgs {
    /// Container name.
    pub name: String,

    /// Seconds to give init before giving up.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

/// Arguments for commands that wait for their transition to complete.
#[derive(Args, Debug)]
pub struct WaitedArgs {
    /// Container name.
    pub name: String,

    /// Seconds to wait for the transition.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

/// Arguments for the `wait` command.
#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Container name.
    pub name: String,

    /// State to wait for, e.g. RUNNING.
    pub state: ContainerState,

    /// Seconds to wait.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

/// Arguments for the `clone` command.
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Source container.
    pub name: String,

    /// Name of the copy.
    pub new_name: String,

    /// Storage backend for the copy (dir, overlayfs, btrfs, lvm, zfs, loop, best).
    #[arg(short = 'B', long, default_value = "dir")]
    pub backend: CloneBackend,
}

fn await_state(container: &Container, target: ContainerState, secs: u64) -> anyhow::Result<()> {
    if container.wait(target, Duration::from_secs(secs)) {
        Ok(())
    } else {
        anyhow::bail!(
            "container {} did not reach {target} within {secs}s (now {})",
            container.name(),
            container.state()
        )
    }
}

/// Executes the `create` command.
///
/// # Errors
///
/// Returns an error if the container exists or the template fails.
pub fn create(registry: &ContainerRegistry, args: &CreateArgs) -> anyhow::Result<()> {
    let container = registry.acquire(&args.name);
    let request = CreateRequest {
        template: args.template.clone(),
        ..CreateRequest::download(&args.distro, &args.arch, &args.release)
    };
    container.create_with(&request)?;
    println!("Created {}", args.name);
    Ok(())
}

/// Executes the `start` command.
///
/// # Errors
///
/// Returns an error if the container cannot be started or does not come up.
pub fn start(registry: &ContainerRegistry, args: &StartArgs) -> anyhow::Result<()> {
    let container = registry.acquire(&args.name);
    container.set_daemonize(!args.foreground);
    container.start(args.init)?;
    if !args.foreground {
        await_state(&container, ContainerState::Running, args.timeout)?;
        println!("Started {}", args.name);
    }
    Ok(())
}

/// Executes the `stop` command.
///
/// # Errors
///
/// Returns an error if the container is not running or does not stop.
pub fn stop(registry: &ContainerRegistry, args: &NameArgs) -> anyhow::Result<()> {
    registry.acquire(&args.name).stop()?;
    println!("Stopped {}", args.name);
    Ok(())
}

/// Executes the `shutdown` command.
///
/// # Errors
///
/// Returns an error if the container is still running after the timeout.
pub fn shutdown(registry: &ContainerRegistry, args: &ShutdownArgs) -> anyhow::Result<()> {
    registry
        .acquire(&args.name)
        .shutdown(Duration::from_secs(args.timeout))?;
    println!("Shut down {}", args.name);
    Ok(())
}

/// Executes the `freeze` command.
///
/// # Errors
///
/// Returns an error if the container is not running or does not freeze.
pub fn freeze(registry: &ContainerRegistry, args: &WaitedArgs) -> anyhow::Result<()> {
    let container = registry.acquire(&args.name);
    container.freeze()?;
    await_state(&container, ContainerState::Frozen, args.timeout)?;
    println!("Frozen {}", args.name);
    Ok(())
}

/// Executes the `unfreeze` command.
///
/// # Errors
///
/// Returns an error if the container is not frozen or does not resume.
pub fn unfreeze(registry: &ContainerRegistry, args: &WaitedArgs) -> anyhow::Result<()> {
    let container = registry.acquire(&args.name);
    container.unfreeze()?;
    await_state(&container, ContainerState::Running, args.timeout)?;
    println!("Unfrozen {}", args.name);
    Ok(())
}

/// Executes the `reboot` command.
///
/// # Errors
///
/// Returns an error if the container is not running or does not come back.
pub fn reboot(registry: &ContainerRegistry, args: &WaitedArgs) -> anyhow::Result<()> {
    let container = registry.acquire(&args.name);
    container.reboot()?;
    await_state(&container, ContainerState::Running, args.timeout)?;
    println!("Rebooted {}", args.name);
    Ok(())
}

/// Executes the `wait` command.
///
/// # Errors
///
/// Returns an error if the state is not reached within the timeout.
pub fn wait(registry: &ContainerRegistry, args: &WaitArgs) -> anyhow::Result<()> {
    await_state(&registry.acquire(&args.name), args.state, args.timeout)
}

/// Executes the `clone` command.
///
/// # Errors
///
/// Returns an error if the source is undefined or the new name is taken.
pub fn clone(registry: &ContainerRegistry, args: &CloneArgs) -> anyhow::Result<()> {
    registry
        .acquire(&args.name)
        .clone_to(&args.new_name, args.backend)?;
    println!("Cloned {} to {} ({})", args.name, args.new_name, args.backend);
    Ok(())
}

/// Executes the `destroy` command.
///
/// # Errors
///
/// Returns an error if the container is running or nothing exists to remove.
pub fn destroy(registry: &ContainerRegistry, args: &NameArgs) -> anyhow::Result<()> {
    registry.acquire(&args.name).destroy()?;
    println!("Destroyed {}", args.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lxkit_common::config::RuntimeConfig;
    use lxkit_runtime::backend::memory::MemoryEngine;

    use super::*;

    fn registry() -> ContainerRegistry {
        let engine = MemoryEngine::with_latency(Duration::from_millis(1));
        ContainerRegistry::new(Arc::new(engine), RuntimeConfig::default())
    }

    #[test]
    fn create_start_stop_destroy_through_handlers() {
        let registry = registry();
        let name = NameArgs {
            name: "web".to_owned(),
        };
        create(
            &registry,
            &CreateArgs {
                name: "web".to_owned(),
                distro: "debian".to_owned(),
                release: "bookworm".to_owned(),
                arch: "arm64".to_owned(),
                template: "download".to_owned(),
            },
        )
        .unwrap();
        start(
            &registry,
            &StartArgs {
                name: "web".to_owned(),
                init: false,
                foreground: false,
                timeout: 5,
            },
        )
        .unwrap();
        assert!(destroy(&registry, &name).is_err());
        stop(&registry, &name).unwrap();
        destroy(&registry, &name).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn wait_reports_unreached_state() {
        let registry = registry();
        let err = wait(
            &registry,
            &WaitArgs {
                name: "ghost".to_owned(),
                state: ContainerState::Running,
                timeout: 0,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("UNDEFINED"));
    }
}
