//! In-process engine that simulates a container host.
//!
//! Config files live in a virtual filesystem, state transitions complete
//! after a configurable latency, and cgroup values are plain strings. The
//! engine counts bindings opened and released so tests can check that
//! the registry frees each binding exactly once.
//!
//! Transitions are resolved lazily: an operation records the target state
//! and when it becomes visible, and the next query past that instant
//! commits it. No background threads are involved.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lxkit_common::constants::config_file_name;
use lxkit_common::error::{LxkitError, Result};
use lxkit_common::types::{CloneBackend, ContainerState};
use lxkit_core::cgroup::{self, memory};
use lxkit_core::config::ConfigStore;

use crate::engine::{CreateRequest, Engine, EngineContainer};

const DEFAULT_LATENCY: Duration = Duration::from_millis(20);
const FIRST_PID: i32 = 1000;

/// Operations that can be made to fail once via [`MemoryEngine::inject_failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// The template fails after laying down the root filesystem.
    Create,
    /// Init cannot be spawned.
    Start,
    /// Removing the container's files fails.
    Destroy,
}

/// Transition that becomes visible at `ready_at`.
#[derive(Debug, Clone, Copy)]
struct Pending {
    target: ContainerState,
    ready_at: Instant,
}

/// Runtime state of one container directory on the simulated host.
#[derive(Debug, Default)]
struct Record {
    rootfs: Option<String>,
    state: Option<ContainerState>,
    pending: Option<Pending>,
    init_pid: Option<i32>,
    cgroup: HashMap<String, String>,
    ignores_shutdown: bool,
}

impl Record {
    fn settle(&mut self, now: Instant) {
        if let Some(pending) = self.pending.filter(|p| p.ready_at <= now) {
            self.state = Some(pending.target);
            self.pending = None;
            if pending.target == ContainerState::Stopped {
                self.init_pid = None;
                self.cgroup.clear();
            }
        }
    }

    fn current(&self) -> ContainerState {
        self.state.unwrap_or(ContainerState::Stopped)
    }
}

#[derive(Debug, Default)]
struct HostState {
    files: HashMap<PathBuf, String>,
    records: HashMap<PathBuf, Record>,
    faults: HashSet<(String, Fault)>,
    next_pid: i32,
}

impl HostState {
    /// The record for `dir`, starting one if the host has none yet.
    fn record(&mut self, dir: &Path, now: Instant) -> &mut Record {
        let record = self.records.entry(dir.to_path_buf()).or_default();
        record.settle(now);
        record
    }

    fn existing(&mut self, dir: &Path, now: Instant) -> Option<&mut Record> {
        let record = self.records.get_mut(dir)?;
        record.settle(now);
        Some(record)
    }

    fn take_fault(&mut self, name: &str, fault: Fault) -> bool {
        self.faults.remove(&(name.to_owned(), fault))
    }

    fn allocate_pid(&mut self) -> i32 {
        if self.next_pid < FIRST_PID {
            self.next_pid = FIRST_PID;
        }
        self.next_pid += 1;
        self.next_pid
    }
}

#[derive(Debug)]
struct Host {
    state: Mutex<HostState>,
    changed: Condvar,
    latency: Duration,
    opened: AtomicUsize,
    released: AtomicUsize,
}

impl Host {
    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Simulated engine for tests and dry runs.
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    host: Arc<Host>,
}

impl MemoryEngine {
    /// Creates an empty host with the default transition latency.
    pub fn new() -> Self {
        Self::with_latency(DEFAULT_LATENCY)
    }

    /// Creates an empty host whose asynchronous transitions take `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            host: Arc::new(Host {
                state: Mutex::new(HostState::default()),
                changed: Condvar::new(),
                latency,
                opened: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
            }),
        }
    }

    /// Makes the next `fault` operation on `name` fail.
    pub fn inject_failure(&self, name: &str, fault: Fault) {
        let _ = self.host.lock().faults.insert((name.to_owned(), fault));
    }

    /// Makes `name`'s init ignore (or honour) shutdown requests.
    ///
    /// Has no effect on a name that was never created.
    pub fn set_ignores_shutdown(&self, config_path: &Path, name: &str, ignores: bool) {
        let now = Instant::now();
        if let Some(record) = self.host.lock().existing(&config_path.join(name), now) {
            record.ignores_shutdown = ignores;
        }
    }

    /// Returns true if anything (config or rootfs) exists for `name`.
    pub fn exists(&self, config_path: &Path, name: &str) -> bool {
        let host = self.host.lock();
        host.files.contains_key(&config_file_name(config_path, name))
            || host
                .records
                .get(&config_path.join(name))
                .is_some_and(|r| r.rootfs.is_some())
    }

    /// Contents of a virtual file, if present.
    pub fn file(&self, path: &Path) -> Option<String> {
        self.host.lock().files.get(path).cloned()
    }

    /// Writes a virtual file.
    pub fn write_file(&self, path: &Path, contents: &str) {
        let _ = self
            .host
            .lock()
            .files
            .insert(path.to_path_buf(), contents.to_owned());
    }

    /// Total bindings opened so far.
    pub fn opened(&self) -> usize {
        self.host.opened.load(Ordering::SeqCst)
    }

    /// Total bindings released so far.
    pub fn released(&self) -> usize {
        self.host.released.load(Ordering::SeqCst)
    }

    /// Bindings currently open.
    pub fn live_bindings(&self) -> usize {
        self.opened().saturating_sub(self.released())
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for MemoryEngine {
    fn open(&self, name: &str, config_path: &Path) -> Box<dyn EngineContainer> {
        let _ = self.host.opened.fetch_add(1, Ordering::SeqCst);
        let binding = MemoryContainer {
            host: Arc::clone(&self.host),
            name: name.to_owned(),
            config_path: Mutex::new(config_path.to_path_buf()),
            store: Mutex::new(ConfigStore::new()),
        };
        binding.reload_persisted();
        Box::new(binding)
    }

    fn list_defined(&self, config_path: &Path) -> Result<Vec<String>> {
        let host = self.host.lock();
        let mut names: Vec<String> = host
            .files
            .keys()
            .filter(|path| path.file_name().is_some_and(|f| f == "config"))
            .filter_map(|path| {
                let dir = path.parent()?;
                (dir.parent()? == config_path)
                    .then(|| dir.file_name()?.to_str().map(str::to_owned))
                    .flatten()
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn version(&self) -> String {
        format!("memory-{}", lxkit_common::constants::VERSION)
    }
}

/// Binding to one container on the simulated host.
struct MemoryContainer {
    host: Arc<Host>,
    name: String,
    config_path: Mutex<PathBuf>,
    store: Mutex<ConfigStore>,
}

impl MemoryContainer {
    fn dir(&self) -> PathBuf {
        self.config_path().join(&self.name)
    }

    fn config_file(&self) -> PathBuf {
        config_file_name(&self.config_path(), &self.name)
    }

    fn store(&self) -> MutexGuard<'_, ConfigStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the in-memory config with the persisted one, if any.
    fn reload_persisted(&self) {
        let text = self.host.lock().files.get(&self.config_file()).cloned();
        let store = match text.as_deref().map(ConfigStore::parse) {
            Some(Ok(store)) => store,
            Some(Err(e)) => {
                tracing::warn!(name = %self.name, error = %e, "persisted config unreadable");
                ConfigStore::new()
            }
            None => ConfigStore::new(),
        };
        *self.store() = store;
    }

    /// Runs `f` on this container's record, if it has one, with the host
    /// locked.
    fn with_record<T>(&self, f: impl FnOnce(&mut Record) -> T) -> Option<T> {
        let dir = self.dir();
        let mut host = self.host.lock();
        let out = host.existing(&dir, Instant::now()).map(f);
        drop(host);
        self.host.changed.notify_all();
        out
    }

    fn no_cgroup(&self) -> LxkitError {
        LxkitError::NotFound {
            kind: "cgroup",
            id: self.name.clone(),
        }
    }

    /// Moves an active container towards `target` through `via`.
    fn transition(
        &self,
        operation: &'static str,
        allowed: &[ContainerState],
        via: ContainerState,
        target: ContainerState,
    ) -> Result<()> {
        let defined = self.is_defined();
        let latency = self.host.latency;
        let rejected = |state: ContainerState| -> Result<()> {
            Err(LxkitError::engine(operation, &self.name, format!("container is {state}")))
        };
        self.with_record(|record| {
            let state = record.current();
            if !defined || !allowed.contains(&state) {
                return rejected(state);
            }
            record.state = Some(via);
            record.pending = Some(Pending {
                target,
                ready_at: Instant::now() + latency,
            });
            Ok(())
        })
        .unwrap_or_else(|| rejected(self.state()))
    }

    fn default_config(&self, request: &CreateRequest) -> ConfigStore {
        let mut store = ConfigStore::new();
        store.append("lxc.include", &format!("/usr/share/lxc/config/{}.common.conf", request.distro));
        store.append("lxc.arch", &request.arch);
        store.append("lxc.utsname", &self.name);
        store.append("lxc.rootfs", &self.dir().join("rootfs").display().to_string());
        store.append("lxc.cap.drop", "sys_module");
        store.append("lxc.cap.drop", "mac_admin");
        store.append("lxc.network.0.type", "veth");
        store.append("lxc.network.0.link", "lxcbr0");
        store.append("lxc.network.0.flags", "up");
        store.append("lxc.network.0.mtu", "1500");
        store
    }
}

fn default_cgroup() -> HashMap<String, String> {
    [
        (memory::USAGE, "8482816"),
        (memory::MAX_USAGE, "16777216"),
        (memory::LIMIT, "9223372036854771712"),
        (memory::SOFT_LIMIT, "9223372036854771712"),
        (memory::SWAP_USAGE, "8482816"),
        (memory::SWAP_LIMIT, "9223372036854771712"),
        ("cpu.shares", "1024"),
        ("pids.current", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}

impl EngineContainer for MemoryContainer {
    fn name(&self) -> &str {
        &self.name
    }

    fn config_path(&self) -> PathBuf {
        self.config_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_config_path(&self, path: &Path) -> Result<()> {
        *self.config_path.lock().unwrap_or_else(PoisonError::into_inner) = path.to_path_buf();
        self.reload_persisted();
        Ok(())
    }

    fn is_defined(&self) -> bool {
        self.host.lock().files.contains_key(&self.config_file())
    }

    fn state(&self) -> ContainerState {
        if !self.is_defined() {
            return ContainerState::Undefined;
        }
        // Defined through a bare config file and never started.
        self.with_record(|record| record.current())
            .unwrap_or(ContainerState::Stopped)
    }

    fn init_pid(&self) -> Option<i32> {
        self.with_record(|record| record.init_pid).flatten()
    }

    fn create(&self, request: &CreateRequest) -> Result<()> {
        let dir = self.dir();
        let config_file = self.config_file();
        let store = self.default_config(request);

        let mut host = self.host.lock();
        if host.files.contains_key(&config_file) {
            return Err(LxkitError::AlreadyExists {
                name: self.name.clone(),
            });
        }
        let rootfs = dir.join("rootfs").display().to_string();
        host.record(&dir, Instant::now()).rootfs = Some(rootfs);
        if host.take_fault(&self.name, Fault::Create) {
            return Err(LxkitError::engine(
                "create",
                &self.name,
                format!("template {} failed", request.template),
            ));
        }
        let _ = host.files.insert(config_file, store.render());
        host.record(&dir, Instant::now()).state = Some(ContainerState::Stopped);
        drop(host);

        *self.store() = store;
        Ok(())
    }

    fn start(&self, _use_init: bool, daemonize: bool) -> Result<()> {
        let dir = self.dir();
        let latency = self.host.latency;
        let config_file = self.config_file();
        let mut host = self.host.lock();
        if !host.files.contains_key(&config_file) {
            return Err(LxkitError::NotDefined {
                name: self.name.clone(),
            });
        }
        if host.take_fault(&self.name, Fault::Start) {
            return Err(LxkitError::engine("start", &self.name, "failed to spawn init"));
        }
        let pid = host.allocate_pid();
        let record = host.record(&dir, Instant::now());
        if record.current() != ContainerState::Stopped {
            let state = record.current();
            return Err(LxkitError::engine("start", &self.name, format!("container is {state}")));
        }
        record.state = Some(ContainerState::Starting);
        record.pending = Some(Pending {
            target: ContainerState::Running,
            ready_at: Instant::now() + latency,
        });
        record.init_pid = Some(pid);
        record.cgroup = default_cgroup();
        self.host.changed.notify_all();

        if daemonize {
            return Ok(());
        }

        // Foreground: block until init goes away.
        loop {
            let (guard, _) = self
                .host
                .changed
                .wait_timeout(host, latency.max(Duration::from_millis(1)))
                .unwrap_or_else(PoisonError::into_inner);
            host = guard;
            let alive = host.existing(&dir, Instant::now()).is_some_and(|record| {
                record.current() != ContainerState::Stopped && record.init_pid == Some(pid)
            });
            if !alive {
                return Ok(());
            }
        }
    }

    fn stop(&self) -> Result<()> {
        self.transition(
            "stop",
            &[
                ContainerState::Starting,
                ContainerState::Running,
                ContainerState::Freezing,
                ContainerState::Frozen,
                ContainerState::Thawed,
            ],
            ContainerState::Stopping,
            ContainerState::Stopped,
        )
    }

    fn shutdown(&self, _timeout: Duration) -> Result<()> {
        let ignores = self
            .with_record(|record| record.ignores_shutdown)
            .unwrap_or(false);
        if ignores {
            let state = self.state();
            return if state.is_active() {
                Ok(())
            } else {
                Err(LxkitError::engine("shutdown", &self.name, format!("container is {state}")))
            };
        }
        self.transition(
            "shutdown",
            &[ContainerState::Running, ContainerState::Thawed],
            ContainerState::Stopping,
            ContainerState::Stopped,
        )
    }

    fn reboot(&self) -> Result<()> {
        let dir = self.dir();
        let latency = self.host.latency;
        let mut host = self.host.lock();
        let pid = host.allocate_pid();
        let state = host
            .existing(&dir, Instant::now())
            .map_or(ContainerState::Stopped, |record| record.current());
        if state != ContainerState::Running {
            return Err(LxkitError::engine("reboot", &self.name, format!("container is {state}")));
        }
        let record = host.record(&dir, Instant::now());
        record.state = Some(ContainerState::Starting);
        record.pending = Some(Pending {
            target: ContainerState::Running,
            ready_at: Instant::now() + latency,
        });
        record.init_pid = Some(pid);
        drop(host);
        self.host.changed.notify_all();
        Ok(())
    }

    fn freeze(&self) -> Result<()> {
        self.transition(
            "freeze",
            &[ContainerState::Running, ContainerState::Thawed],
            ContainerState::Freezing,
            ContainerState::Frozen,
        )
    }

    fn unfreeze(&self) -> Result<()> {
        self.transition(
            "unfreeze",
            &[ContainerState::Frozen],
            ContainerState::Thawed,
            ContainerState::Running,
        )
    }

    fn destroy(&self) -> Result<()> {
        let dir = self.dir();
        let config_file = self.config_file();
        let mut host = self.host.lock();
        let (state, has_rootfs) = host
            .existing(&dir, Instant::now())
            .map_or((ContainerState::Stopped, false), |record| {
                (record.current(), record.rootfs.is_some())
            });
        if state.is_active() {
            return Err(LxkitError::engine("destroy", &self.name, format!("container is {state}")));
        }
        let has_config = host.files.contains_key(&config_file);
        if !has_rootfs && !has_config {
            return Err(LxkitError::NotDefined {
                name: self.name.clone(),
            });
        }
        if host.take_fault(&self.name, Fault::Destroy) {
            return Err(LxkitError::io(&dir, std::io::Error::other("device or resource busy")));
        }
        let _ = host.files.remove(&config_file);
        let _ = host.records.remove(&dir);
        drop(host);

        *self.store() = ConfigStore::new();
        Ok(())
    }

    fn clone_to(&self, new_name: &str, backend: CloneBackend) -> Result<()> {
        let root = self.config_path();
        let source_dir = self.dir();
        let target_dir = root.join(new_name);
        let target_file = config_file_name(&root, new_name);

        let mut host = self.host.lock();
        if host.files.contains_key(&target_file) {
            return Err(LxkitError::AlreadyExists {
                name: new_name.to_owned(),
            });
        }
        let text = host
            .files
            .get(&self.config_file())
            .cloned()
            .ok_or_else(|| LxkitError::NotDefined {
                name: self.name.clone(),
            })?;
        let source_rootfs = host
            .existing(&source_dir, Instant::now())
            .and_then(|record| record.rootfs.clone())
            .unwrap_or_default();

        let rootfs = if backend.is_snapshot() {
            format!(
                "{backend}:{source_rootfs}:{}",
                target_dir.join("delta0").display()
            )
        } else {
            target_dir.join("rootfs").display().to_string()
        };
        let mut store = ConfigStore::parse(&text)?;
        store.replace("lxc.utsname", new_name);
        store.replace("lxc.rootfs", &rootfs);

        let _ = host.files.insert(target_file, store.render());
        let record = host.record(&target_dir, Instant::now());
        record.rootfs = Some(rootfs);
        record.state = Some(ContainerState::Stopped);
        Ok(())
    }

    fn load_config(&self, path: &Path) -> Result<()> {
        let text = self.host.lock().files.get(path).cloned().ok_or_else(|| {
            LxkitError::NotFound {
                kind: "config file",
                id: path.display().to_string(),
            }
        })?;
        *self.store() = ConfigStore::parse(&text)?;
        Ok(())
    }

    fn save_config(&self, path: &Path) -> Result<()> {
        let text = self.store().render();
        let _ = self.host.lock().files.insert(path.to_path_buf(), text);
        Ok(())
    }

    fn config_item(&self, key: &str) -> Vec<String> {
        self.store().get(key)
    }

    fn set_config_item(&self, key: &str, value: &str) -> Result<()> {
        super::validate_key(key)?;
        self.store().append(key, value);
        Ok(())
    }

    fn clear_config_item(&self, key: &str) -> Result<()> {
        super::validate_key(key)?;
        let _ = self.store().clear(key);
        Ok(())
    }

    fn keys(&self, prefix: &str) -> Vec<String> {
        self.store().keys(prefix)
    }

    fn cgroup_item(&self, key: &str) -> Result<Vec<String>> {
        self.with_record(|record| {
            if !record.current().is_active() {
                return Err(self.no_cgroup());
            }
            record
                .cgroup
                .get(key)
                .map(|value| vec![value.clone()])
                .ok_or_else(|| LxkitError::NotFound {
                    kind: "cgroup key",
                    id: key.to_owned(),
                })
        })
        .unwrap_or_else(|| Err(self.no_cgroup()))
    }

    fn set_cgroup_item(&self, key: &str, value: &str) -> Result<()> {
        if !cgroup::is_writable(key) {
            return Err(LxkitError::Config {
                message: format!("cgroup key {key} is read-only"),
            });
        }
        self.with_record(|record| {
            if !record.current().is_active() {
                return Err(self.no_cgroup());
            }
            let _ = record.cgroup.insert(key.to_owned(), value.to_owned());
            Ok(())
        })
        .unwrap_or_else(|| Err(self.no_cgroup()))
    }

    fn num_network_interfaces(&self) -> usize {
        self.store().network_interfaces()
    }

    fn release(&self) {
        let _ = self.host.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(engine: &MemoryEngine, name: &str) -> Box<dyn EngineContainer> {
        engine.open(name, Path::new("/var/lib/lxc"))
    }

    #[test]
    fn undefined_binding_reports_sentinel() {
        let engine = MemoryEngine::new();
        let c = open(&engine, "ghost");
        assert!(!c.is_defined());
        assert_eq!(c.state(), ContainerState::Undefined);
        assert!(c.init_pid().is_none());
    }

    #[test]
    fn create_writes_config_file() {
        let engine = MemoryEngine::new();
        let c = open(&engine, "rubik");
        c.create(&CreateRequest::download("ubuntu", "amd64", "jammy")).unwrap();
        assert!(c.is_defined());
        assert_eq!(c.state(), ContainerState::Stopped);

        let text = engine
            .file(Path::new("/var/lib/lxc/rubik/config"))
            .unwrap();
        assert!(text.contains("lxc.utsname = rubik"));
        assert_eq!(c.config_item("lxc.network.0.mtu"), vec!["1500"]);
    }

    #[test]
    fn transitions_complete_after_latency() {
        let engine = MemoryEngine::with_latency(Duration::from_millis(10));
        let c = open(&engine, "rubik");
        c.create(&CreateRequest::download("ubuntu", "amd64", "jammy")).unwrap();
        c.start(false, true).unwrap();
        assert_eq!(c.state(), ContainerState::Starting);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(c.state(), ContainerState::Running);
        assert!(c.init_pid().is_some());
    }

    #[test]
    fn failed_create_leaves_rootfs_only() {
        let engine = MemoryEngine::new();
        engine.inject_failure("half", Fault::Create);
        let c = open(&engine, "half");
        assert!(c.create(&CreateRequest::download("ubuntu", "amd64", "jammy")).is_err());
        assert!(!c.is_defined());
        assert!(engine.exists(Path::new("/var/lib/lxc"), "half"));

        c.destroy().unwrap();
        assert!(!engine.exists(Path::new("/var/lib/lxc"), "half"));
        assert!(matches!(c.destroy(), Err(LxkitError::NotDefined { .. })));
    }

    #[test]
    fn cgroup_requires_running_container() {
        let engine = MemoryEngine::with_latency(Duration::ZERO);
        let c = open(&engine, "rubik");
        c.create(&CreateRequest::download("ubuntu", "amd64", "jammy")).unwrap();
        assert!(c.cgroup_item(memory::LIMIT).is_err());

        c.start(false, true).unwrap();
        assert_eq!(c.memory_limit().unwrap().as_u64(), 9_223_372_036_854_771_712);
        c.set_cgroup_item(memory::LIMIT, "268435456").unwrap();
        assert_eq!(c.memory_limit().unwrap().as_u64(), 268_435_456);
        assert!(c.set_cgroup_item(memory::USAGE, "0").is_err());
    }

    #[test]
    fn list_defined_only_sees_direct_children_of_root() {
        let engine = MemoryEngine::new();
        engine.write_file(Path::new("/var/lib/lxc/a/config"), "lxc.utsname = a\n");
        engine.write_file(Path::new("/srv/lxc/b/config"), "lxc.utsname = b\n");
        engine.write_file(Path::new("/var/lib/lxc/c/notes"), "");
        assert_eq!(engine.list_defined(Path::new("/var/lib/lxc")).unwrap(), vec!["a"]);
    }

    #[test]
    fn queries_on_unknown_names_leave_no_trace() {
        let engine = MemoryEngine::with_latency(Duration::ZERO);
        let tracked = || engine.host.lock().records.len();
        let ghost = open(&engine, "ghost");

        assert_eq!(ghost.state(), ContainerState::Undefined);
        assert!(ghost.init_pid().is_none());
        assert!(ghost.cgroup_item(memory::USAGE).is_err());
        assert!(ghost.set_cgroup_item(memory::LIMIT, "1").is_err());
        assert!(ghost.stop().is_err());
        assert!(ghost.shutdown(Duration::ZERO).is_err());
        assert!(ghost.reboot().is_err());
        assert!(ghost.start(false, true).is_err());
        assert!(ghost.destroy().is_err());
        engine.set_ignores_shutdown(Path::new("/var/lib/lxc"), "ghost", true);
        assert_eq!(tracked(), 0);

        open(&engine, "rubik")
            .create(&CreateRequest::download("ubuntu", "amd64", "jammy"))
            .unwrap();
        assert_eq!(tracked(), 1);
    }

    #[test]
    fn bare_config_file_starts_like_a_created_container() {
        let engine = MemoryEngine::with_latency(Duration::ZERO);
        engine.write_file(Path::new("/var/lib/lxc/plain/config"), "lxc.utsname = plain\n");
        let c = open(&engine, "plain");
        assert_eq!(c.state(), ContainerState::Stopped);
        c.start(false, true).unwrap();
        assert_eq!(c.state(), ContainerState::Running);
        assert!(c.init_pid().is_some());
    }
}
