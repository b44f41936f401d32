//! Container handle and lifecycle operations.
//!
//! A [`Container`] is a counted reference to the registry's single engine
//! binding for a name. Every holder of the same name sees the same
//! binding, so a config path or daemonize flag set through one handle is
//! visible through all of them. Dropping the last handle releases the
//! binding.
//!
//! Preconditions are checked against the state observed at call time.
//! Nothing serialises two callers driving the same container: a `start`
//! racing a `stop` gets whatever order the engine applies them in.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use lxkit_common::constants::validate_name;
use lxkit_common::error::{LxkitError, Result};
use lxkit_common::types::{ByteSize, CloneBackend, ContainerState};

use crate::engine::{CreateRequest, EngineContainer};
use crate::registry::Shared;

/// Engine binding shared by every handle to one name.
pub(crate) struct Binding {
    engine: Box<dyn EngineContainer>,
    daemonize: AtomicBool,
}

impl Binding {
    pub(crate) fn new(engine: Box<dyn EngineContainer>) -> Self {
        Self {
            engine,
            daemonize: AtomicBool::new(false),
        }
    }

    pub(crate) fn engine(&self) -> &dyn EngineContainer {
        self.engine.as_ref()
    }
}

/// Handle to a named container, obtained from a
/// [`ContainerRegistry`](crate::registry::ContainerRegistry).
pub struct Container {
    binding: Arc<Binding>,
    shared: Arc<Shared>,
}

impl Container {
    pub(crate) const fn new(binding: Arc<Binding>, shared: Arc<Shared>) -> Self {
        Self { binding, shared }
    }

    fn engine(&self) -> &dyn EngineContainer {
        self.binding.engine()
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Container name.
    pub fn name(&self) -> &str {
        self.engine().name()
    }

    /// Current state; [`ContainerState::Undefined`] if not defined.
    pub fn state(&self) -> ContainerState {
        self.engine().state()
    }

    /// Returns true while the container has a live init process.
    pub fn running(&self) -> bool {
        self.state().is_active()
    }

    /// Returns true if persisted configuration exists.
    pub fn defined(&self) -> bool {
        self.engine().is_defined()
    }

    /// PID of the init process, `None` when not running.
    pub fn init_pid(&self) -> Option<i32> {
        self.engine().init_pid()
    }

    /// Whether [`Self::start`] returns as soon as init is forked.
    pub fn daemonize(&self) -> bool {
        self.binding.daemonize.load(Ordering::Acquire)
    }

    /// Sets the daemonize flag for every holder of this name.
    pub fn set_daemonize(&self, daemonize: bool) {
        self.binding.daemonize.store(daemonize, Ordering::Release);
    }

    /// Root under which this container's config lives.
    pub fn config_path(&self) -> PathBuf {
        self.engine().config_path()
    }

    /// Moves this container to a different config root.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot rebind the container.
    pub fn set_config_path(&self, path: &Path) -> Result<()> {
        self.engine().set_config_path(path)?;
        tracing::debug!(name = %self.name(), path = %path.display(), "config path changed");
        Ok(())
    }

    /// Path of the persisted config file, `<config_path>/<name>/config`.
    pub fn config_file_name(&self) -> PathBuf {
        lxkit_common::constants::config_file_name(&self.config_path(), self.name())
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Provisions the container from the `download` template.
    ///
    /// # Errors
    ///
    /// Returns an error if the container already exists or the template fails.
    pub fn create(&self, distro: &str, arch: &str, release: &str) -> Result<()> {
        self.create_with(&CreateRequest::download(distro, arch, release))
    }

    /// Provisions the container with an explicit template request.
    ///
    /// A failed template may leave a partial filesystem behind;
    /// [`Self::destroy`] cleans it up.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, the container already
    /// exists, or the template fails.
    pub fn create_with(&self, request: &CreateRequest) -> Result<()> {
        validate_name(self.name())?;
        if self.defined() {
            return Err(LxkitError::AlreadyExists {
                name: self.name().to_owned(),
            });
        }
        self.engine().create(request).inspect_err(|e| {
            tracing::warn!(name = %self.name(), template = %request.template, error = %e, "create failed");
        })?;
        tracing::info!(
            name = %self.name(),
            distro = %request.distro,
            release = %request.release,
            arch = %request.arch,
            "container created"
        );
        Ok(())
    }

    /// Creates `new_name` from this container's filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if either name is invalid, this container is not
    /// defined, `new_name` is already in use, or the engine fails to copy.
    pub fn clone_to(&self, new_name: &str, backend: CloneBackend) -> Result<()> {
        validate_name(self.name())?;
        validate_name(new_name)?;
        let _ = self.require("clone", |_| true)?;
        let taken = new_name == self.name()
            || self
                .shared
                .engine()
                .list_defined(&self.config_path())?
                .iter()
                .any(|n| n == new_name);
        if taken {
            return Err(LxkitError::AlreadyExists {
                name: new_name.to_owned(),
            });
        }
        self.engine().clone_to(new_name, backend)?;
        tracing::info!(name = %self.name(), new_name, %backend, "container cloned");
        Ok(())
    }

    /// Spawns the container's init process.
    ///
    /// When daemonized this returns once init is forked and the caller
    /// should [`Self::wait`] for [`ContainerState::Running`]; otherwise it
    /// blocks until init exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is undefined, already active, or
    /// init cannot be spawned.
    pub fn start(&self, use_init: bool) -> Result<()> {
        validate_name(self.name())?;
        let _ = self.require("start", |s| s == ContainerState::Stopped)?;
        let daemonize = self.daemonize();
        tracing::info!(name = %self.name(), use_init, daemonize, "starting container");
        self.engine().start(use_init, daemonize).inspect_err(|e| {
            tracing::warn!(name = %self.name(), error = %e, "start failed");
        })
    }

    /// Kills every process and returns once the engine reports `STOPPED`.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not running, the engine fails,
    /// or `STOPPED` is not observed within the configured stop timeout.
    pub fn stop(&self) -> Result<()> {
        let _ = self.require("stop", ContainerState::is_active)?;
        self.engine().stop()?;
        let timeout = self.shared.config().stop_timeout;
        if !self.wait(ContainerState::Stopped, timeout) {
            tracing::warn!(name = %self.name(), state = %self.state(), "stop not confirmed");
            return Err(LxkitError::Timeout {
                operation: "stop",
                name: self.name().to_owned(),
                timeout,
            });
        }
        tracing::info!(name = %self.name(), "container stopped");
        Ok(())
    }

    /// Requests a clean shutdown and waits up to `timeout` for it.
    ///
    /// A container that ignores the request is left running; escalating
    /// to [`Self::stop`] is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not running, the request cannot
    /// be delivered, or the container is still up when `timeout` elapses.
    pub fn shutdown(&self, timeout: Duration) -> Result<()> {
        let _ = self.require("shutdown", ContainerState::is_active)?;
        let started = Instant::now();
        self.engine().shutdown(timeout)?;

        let remaining = timeout.saturating_sub(started.elapsed());
        if !self.wait(ContainerState::Stopped, remaining) {
            tracing::warn!(name = %self.name(), timeout_ms = timeout.as_millis(), "shutdown timed out");
            return Err(LxkitError::Timeout {
                operation: "shutdown",
                name: self.name().to_owned(),
                timeout,
            });
        }
        tracing::info!(name = %self.name(), "container shut down");
        Ok(())
    }

    /// Asks a running container to restart its init process.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not running or the request
    /// cannot be delivered.
    pub fn reboot(&self) -> Result<()> {
        let _ = self.require("reboot", |s| s == ContainerState::Running)?;
        self.engine().reboot()?;
        tracing::info!(name = %self.name(), "reboot requested");
        Ok(())
    }

    /// Starts suspending the container; wait for [`ContainerState::Frozen`].
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not running or the freezer fails.
    pub fn freeze(&self) -> Result<()> {
        let _ = self.require("freeze", |s| {
            matches!(s, ContainerState::Running | ContainerState::Thawed)
        })?;
        self.engine().freeze()?;
        tracing::info!(name = %self.name(), "freeze requested");
        Ok(())
    }

    /// Starts resuming the container; wait for [`ContainerState::Running`].
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not frozen or the freezer fails.
    pub fn unfreeze(&self) -> Result<()> {
        let _ = self.require("unfreeze", |s| s == ContainerState::Frozen)?;
        self.engine().unfreeze()?;
        tracing::info!(name = %self.name(), "unfreeze requested");
        Ok(())
    }

    /// Removes the container's config and filesystem.
    ///
    /// Leftovers of an interrupted [`Self::create`] are removed even though
    /// the container never became defined.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, the container is running,
    /// nothing exists to remove, or removal fails.
    pub fn destroy(&self) -> Result<()> {
        validate_name(self.name())?;
        let state = self.state();
        if state.is_active() {
            return Err(LxkitError::InvalidState {
                name: self.name().to_owned(),
                state,
                operation: "destroy",
            });
        }
        self.engine().destroy().inspect_err(|e| {
            tracing::warn!(name = %self.name(), error = %e, "destroy failed");
        })?;
        tracing::info!(name = %self.name(), "container destroyed");
        Ok(())
    }

    /// Polls until the container reaches `target` or `timeout` elapses.
    ///
    /// Read-only; safe to call while other threads drive the container.
    pub fn wait(&self, target: ContainerState, timeout: Duration) -> bool {
        self.shared
            .waiter()
            .wait_for_state(target, timeout, || self.state())
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Values of `key` in the in-memory config; empty if absent.
    pub fn config_item(&self, key: &str) -> Vec<String> {
        self.engine().config_item(key)
    }

    /// Appends `value` to `key`; clear the key first to replace it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed.
    pub fn set_config_item(&self, key: &str, value: &str) -> Result<()> {
        self.engine().set_config_item(key, value)
    }

    /// Removes every value of `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed.
    pub fn clear_config_item(&self, key: &str) -> Result<()> {
        self.engine().clear_config_item(key)
    }

    /// Direct sub-keys under `prefix`, e.g. `mtu` under `lxc.network.0`.
    pub fn keys(&self, prefix: &str) -> Vec<String> {
        self.engine().keys(prefix)
    }

    /// Replaces the in-memory config with the contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_config_file(&self, path: &Path) -> Result<()> {
        self.engine().load_config(path)
    }

    /// Writes the in-memory config to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_config_file(&self, path: &Path) -> Result<()> {
        self.engine().save_config(path)
    }

    /// Number of network interfaces in the config.
    pub fn number_of_network_interfaces(&self) -> usize {
        self.engine().num_network_interfaces()
    }

    // ── Cgroups ──────────────────────────────────────────────────────

    /// Reads a cgroup control file, one entry per line, as raw text.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not running or the read fails.
    pub fn cgroup_item(&self, key: &str) -> Result<Vec<String>> {
        let _ = self.require("read cgroup of", ContainerState::is_active)?;
        self.engine().cgroup_item(key)
    }

    /// Writes a cgroup control file.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is read-only, the container is not
    /// running, or the write fails.
    pub fn set_cgroup_item(&self, key: &str, value: &str) -> Result<()> {
        if !lxkit_core::cgroup::is_writable(key) {
            return Err(LxkitError::Config {
                message: format!("cgroup key {key} is read-only"),
            });
        }
        let _ = self.require("write cgroup of", ContainerState::is_active)?;
        self.engine().set_cgroup_item(key, value)?;
        tracing::debug!(name = %self.name(), key, value, "cgroup item set");
        Ok(())
    }

    /// Current memory usage.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not running or accounting is unavailable.
    pub fn memory_usage_in_bytes(&self) -> Result<ByteSize> {
        let _ = self.require("read memory usage of", ContainerState::is_active)?;
        self.engine().memory_usage()
    }

    /// Current memory plus swap usage.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not running or accounting is unavailable.
    pub fn swap_usage_in_bytes(&self) -> Result<ByteSize> {
        let _ = self.require("read swap usage of", ContainerState::is_active)?;
        self.engine().swap_usage()
    }

    /// Hard memory limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not running or accounting is unavailable.
    pub fn memory_limit_in_bytes(&self) -> Result<ByteSize> {
        let _ = self.require("read memory limit of", ContainerState::is_active)?;
        self.engine().memory_limit()
    }

    /// Memory plus swap limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not running or accounting is unavailable.
    pub fn swap_limit_in_bytes(&self) -> Result<ByteSize> {
        let _ = self.require("read swap limit of", ContainerState::is_active)?;
        self.engine().swap_limit()
    }

    /// Checks that the container is defined and `allowed` accepts its state.
    fn require(
        &self,
        operation: &'static str,
        allowed: impl FnOnce(ContainerState) -> bool,
    ) -> Result<ContainerState> {
        let state = self.state();
        if state == ContainerState::Undefined {
            return Err(LxkitError::NotDefined {
                name: self.name().to_owned(),
            });
        }
        if !allowed(state) {
            return Err(LxkitError::InvalidState {
                name: self.name().to_owned(),
                state,
                operation,
            });
        }
        Ok(state)
    }
}

impl Clone for Container {
    fn clone(&self) -> Self {
        self.shared.retain(&self.binding);
        Self::new(Arc::clone(&self.binding), Arc::clone(&self.shared))
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.shared.release(&self.binding);
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name())
            .field("config_path", &self.config_path())
            .finish_non_exhaustive()
    }
}
