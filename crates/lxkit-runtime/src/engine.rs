//! Capability interface onto the container engine.
//!
//! The lifecycle layer never touches namespaces, templates, or storage
//! backends itself. It drives an [`Engine`], which hands out one
//! [`EngineContainer`] binding per container name, and every state change
//! goes through that binding. Swapping the engine (the `lxc-*` tools on a
//! real host, an in-process simulation in tests) leaves the state machine
//! and registry untouched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use lxkit_common::error::Result;
use lxkit_common::types::{ByteSize, CloneBackend, ContainerState};
use lxkit_core::cgroup::memory;

/// Root filesystem request handed to the template collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// Template to run (`download` fetches a prebuilt image).
    pub template: String,
    /// Distribution name, e.g. `ubuntu`.
    pub distro: String,
    /// Architecture, e.g. `amd64`.
    pub arch: String,
    /// Release name, e.g. `jammy`.
    pub release: String,
}

impl CreateRequest {
    /// Builds a request for the `download` template.
    pub fn download(
        distro: impl Into<String>,
        arch: impl Into<String>,
        release: impl Into<String>,
    ) -> Self {
        Self {
            template: "download".to_owned(),
            distro: distro.into(),
            arch: arch.into(),
            release: release.into(),
        }
    }

    /// Returns the arguments passed through to the template.
    pub fn template_args(&self) -> Vec<String> {
        vec![
            "-d".to_owned(),
            self.distro.clone(),
            "-r".to_owned(),
            self.release.clone(),
            "-a".to_owned(),
            self.arch.clone(),
        ]
    }
}

/// Host-wide entry point of a container engine.
pub trait Engine: Send + Sync {
    /// Opens a binding to `name` under `config_path`.
    ///
    /// The container does not need to be defined; a binding to an
    /// undefined name reports [`ContainerState::Undefined`].
    fn open(&self, name: &str, config_path: &Path) -> Box<dyn EngineContainer>;

    /// Lists the defined containers under `config_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config root cannot be enumerated.
    fn list_defined(&self, config_path: &Path) -> Result<Vec<String>>;

    /// Returns the engine's version string.
    fn version(&self) -> String;
}

/// Per-container capability surface of an engine.
///
/// Implementations must be safe to call from many threads at once; the
/// host resources behind them provide per-access atomicity, nothing more.
pub trait EngineContainer: Send + Sync {
    /// Container name.
    fn name(&self) -> &str;

    /// Root under which this container's `<name>/config` lives.
    fn config_path(&self) -> PathBuf;

    /// Moves the binding to a different config root.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot rebind the container.
    fn set_config_path(&self, path: &Path) -> Result<()>;

    /// Returns true if persisted configuration exists.
    fn is_defined(&self) -> bool;

    /// Current state, [`ContainerState::Undefined`] if not defined.
    fn state(&self) -> ContainerState;

    /// PID of the init process while the container is active.
    fn init_pid(&self) -> Option<i32>;

    /// Provisions the root filesystem and config through the template.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails.
    fn create(&self, request: &CreateRequest) -> Result<()>;

    /// Spawns the init process.
    ///
    /// With `daemonize` the call returns once init is forked; otherwise it
    /// blocks until init exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the init process cannot be spawned.
    fn start(&self, use_init: bool, daemonize: bool) -> Result<()>;

    /// Kills every process in the container.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot signal the container.
    fn stop(&self) -> Result<()>;

    /// Asks init to shut down, giving it at most `timeout`.
    ///
    /// Never escalates to a kill. Returning `Ok` only means the request was
    /// delivered; callers observe the outcome through [`Self::state`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered.
    fn shutdown(&self, timeout: Duration) -> Result<()>;

    /// Asks init to restart the container.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered.
    fn reboot(&self) -> Result<()>;

    /// Starts suspending every process in the container.
    ///
    /// # Errors
    ///
    /// Returns an error if the freezer cannot be engaged.
    fn freeze(&self) -> Result<()>;

    /// Starts resuming a frozen container.
    ///
    /// # Errors
    ///
    /// Returns an error if the freezer cannot be released.
    fn unfreeze(&self) -> Result<()>;

    /// Removes persisted config and filesystem, tolerating partial leftovers.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing exists to remove or removal fails.
    fn destroy(&self) -> Result<()>;

    /// Materialises `new_name` from this container's filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy or snapshot fails.
    fn clone_to(&self, new_name: &str, backend: CloneBackend) -> Result<()>;

    /// Replaces the in-memory config with the contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn load_config(&self, path: &Path) -> Result<()>;

    /// Writes the in-memory config to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save_config(&self, path: &Path) -> Result<()>;

    /// Values of `key` in the in-memory config; empty if absent.
    fn config_item(&self, key: &str) -> Vec<String>;

    /// Appends a value to `key` in the in-memory config.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed.
    fn set_config_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes every value of `key` from the in-memory config.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed.
    fn clear_config_item(&self, key: &str) -> Result<()>;

    /// Direct sub-keys of `prefix` in the in-memory config.
    fn keys(&self, prefix: &str) -> Vec<String>;

    /// Reads a cgroup control file of the running container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container has no cgroup or the read fails.
    fn cgroup_item(&self, key: &str) -> Result<Vec<String>>;

    /// Writes a cgroup control file of the running container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container has no cgroup or the write fails.
    fn set_cgroup_item(&self, key: &str, value: &str) -> Result<()>;

    /// Number of network interfaces in the in-memory config.
    fn num_network_interfaces(&self) -> usize;

    /// Releases engine resources held by this binding.
    ///
    /// Called exactly once, when the last holder lets go of the name.
    fn release(&self);

    /// Current memory usage.
    ///
    /// # Errors
    ///
    /// Returns an error if the accounting file cannot be read or parsed.
    fn memory_usage(&self) -> Result<ByteSize> {
        memory::parse_bytes(memory::USAGE, &self.cgroup_item(memory::USAGE)?)
    }

    /// Current memory plus swap usage.
    ///
    /// # Errors
    ///
    /// Returns an error if the accounting file cannot be read or parsed.
    fn swap_usage(&self) -> Result<ByteSize> {
        memory::parse_bytes(memory::SWAP_USAGE, &self.cgroup_item(memory::SWAP_USAGE)?)
    }

    /// Hard memory limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the limit file cannot be read or parsed.
    fn memory_limit(&self) -> Result<ByteSize> {
        memory::parse_bytes(memory::LIMIT, &self.cgroup_item(memory::LIMIT)?)
    }

    /// Memory plus swap limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the limit file cannot be read or parsed.
    fn swap_limit(&self) -> Result<ByteSize> {
        memory::parse_bytes(memory::SWAP_LIMIT, &self.cgroup_item(memory::SWAP_LIMIT)?)
    }
}
