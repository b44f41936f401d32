//! Engine backed by the `lxc-*` command line tools.
//!
//! Every lifecycle operation runs one tool with `-n <name> -P <root>` and
//! maps a non-zero exit to [`LxkitError::Engine`] carrying the tool's
//! stderr. Config items are served from a [`ConfigStore`] loaded from the
//! container's config file; cgroup items go straight to the cgroup
//! filesystem of the init process.
//!
//! In-memory config edits only reach the tools once saved with
//! [`EngineContainer::save_config`].

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lxkit_common::config::RuntimeConfig;
use lxkit_common::constants::{
    CGROUP_ROOT, CONFIG_FILE_NAME, PROC_ROOT, config_file_name, validate_name,
};
use lxkit_common::error::{LxkitError, Result};
use lxkit_common::types::{CloneBackend, ContainerState};
use lxkit_core::cgroup::CgroupAccessor;
use lxkit_core::config::ConfigStore;
use nix::errno::Errno;
use nix::sys::signal;
use nix::unistd::Pid;

use crate::engine::{CreateRequest, Engine, EngineContainer};

/// Tool whose presence marks an LXC installation.
pub const PROBE_TOOL: &str = "lxc-start";

/// Init binary used by `start(use_init = true)`.
const INIT_PATH: &str = "/sbin/init";

/// Locates the `lxc-*` binaries.
#[derive(Debug, Clone)]
struct Tools {
    dir: Option<PathBuf>,
}

impl Tools {
    fn resolve(&self, tool: &str) -> Result<PathBuf> {
        let not_found = || LxkitError::NotFound {
            kind: "lxc tool",
            id: format!("{tool} (install lxc or set LXKIT_LXC_PATH)"),
        };
        match &self.dir {
            Some(dir) => {
                let path = dir.join(tool);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(not_found())
                }
            }
            None => which::which(tool).map_err(|_| not_found()),
        }
    }

    fn command(&self, tool: &str) -> Result<Command> {
        let mut cmd = Command::new(self.resolve(tool)?);
        let _ = cmd.stdin(Stdio::null());
        Ok(cmd)
    }

    /// Runs `tool` to completion, returning its stdout.
    fn run(
        &self,
        tool: &str,
        operation: &'static str,
        name: &str,
        args: &[String],
    ) -> Result<String> {
        tracing::debug!(tool, name, args = ?args, "running lxc tool");
        let output = self
            .command(tool)?
            .args(args)
            .output()
            .map_err(|e| LxkitError::io(tool, e))?;
        check_exit(tool, operation, name, &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Maps a non-zero exit to an engine failure carrying the tool's stderr.
fn check_exit(tool: &str, operation: &'static str, name: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    Err(LxkitError::engine(
        operation,
        name,
        if stderr.is_empty() {
            format!("{tool} exited with {}", output.status)
        } else {
            stderr
        },
    ))
}

/// Engine that drives an installed LXC through its command line tools.
#[derive(Debug, Clone)]
pub struct LxcToolsEngine {
    tools: Arc<Tools>,
}

impl LxcToolsEngine {
    /// Creates an engine, checking that the tools are installed.
    ///
    /// # Errors
    ///
    /// Returns [`LxkitError::NotFound`] naming the missing binary.
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let tools = Tools {
            dir: config.lxc_path.clone(),
        };
        let probe = tools.resolve(PROBE_TOOL)?;
        tracing::debug!(path = %probe.display(), "lxc tools located");
        Ok(Self {
            tools: Arc::new(tools),
        })
    }
}

impl Engine for LxcToolsEngine {
    fn open(&self, name: &str, config_path: &Path) -> Box<dyn EngineContainer> {
        let binding = LxcContainer {
            tools: Arc::clone(&self.tools),
            name: name.to_owned(),
            config_path: Mutex::new(config_path.to_path_buf()),
            store: Mutex::new(ConfigStore::new()),
        };
        binding.reload_persisted();
        Box::new(binding)
    }

    fn list_defined(&self, config_path: &Path) -> Result<Vec<String>> {
        list_defined_under(config_path)
    }

    fn version(&self) -> String {
        self.tools
            .run(PROBE_TOOL, "version", "", &["--version".to_owned()])
            .map(|out| out.trim().to_owned())
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not query lxc version");
                "unknown".to_owned()
            })
    }
}

/// Names of the directories under `config_path` that hold a config file.
fn list_defined_under(config_path: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(config_path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(LxkitError::io(config_path, e)),
    };
    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.path().join(CONFIG_FILE_NAME).is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    Ok(names)
}

/// Parses the value printed by `lxc-info -H -p`.
fn parse_pid(output: &str) -> Option<i32> {
    output.trim().parse::<i32>().ok().filter(|pid| *pid > 0)
}

/// Returns true if `pid` names a live process.
fn process_alive(pid: i32) -> bool {
    matches!(signal::kill(Pid::from_raw(pid), None), Ok(()) | Err(Errno::EPERM))
}

/// Whole seconds covering `timeout`, as `lxc-stop -t` expects.
fn timeout_secs(timeout: Duration) -> u128 {
    timeout.as_millis().div_ceil(1000)
}

/// Arguments for `lxc-copy`.
fn copy_args(new_name: &str, backend: CloneBackend) -> Vec<String> {
    let mut args = vec![
        "-N".to_owned(),
        new_name.to_owned(),
        "-B".to_owned(),
        backend.as_str().to_owned(),
    ];
    if backend.is_snapshot() {
        args.push("-s".to_owned());
    }
    args
}

/// Binding to one container managed by the `lxc-*` tools.
struct LxcContainer {
    tools: Arc<Tools>,
    name: String,
    config_path: Mutex<PathBuf>,
    store: Mutex<ConfigStore>,
}

impl LxcContainer {
    fn store(&self) -> MutexGuard<'_, ConfigStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dir(&self) -> PathBuf {
        self.config_path().join(&self.name)
    }

    fn config_file(&self) -> PathBuf {
        config_file_name(&self.config_path(), &self.name)
    }

    /// Replaces the in-memory config with the persisted one, if any.
    fn reload_persisted(&self) {
        let path = self.config_file();
        let store = if path.is_file() {
            ConfigStore::load(&path).unwrap_or_else(|e| {
                tracing::warn!(name = %self.name, error = %e, "persisted config unreadable");
                ConfigStore::new()
            })
        } else {
            ConfigStore::new()
        };
        *self.store() = store;
    }

    /// `-n <name> -P <root>` followed by `extra`.
    fn args<I, S>(&self, extra: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = vec![
            "-n".to_owned(),
            self.name.clone(),
            "-P".to_owned(),
            self.config_path().display().to_string(),
        ];
        args.extend(extra.into_iter().map(Into::into));
        args
    }

    fn run<I, S>(&self, tool: &str, operation: &'static str, extra: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools.run(tool, operation, &self.name, &self.args(extra))
    }

    /// The container directory, resolved, provided it sits directly under
    /// the resolved config root.
    fn partial_dir(&self) -> Result<PathBuf> {
        let root = self.config_path();
        let root = root.canonicalize().map_err(|e| LxkitError::io(&root, e))?;
        let dir = self.dir();
        let dir = dir.canonicalize().map_err(|e| LxkitError::io(&dir, e))?;
        if dir.parent() != Some(root.as_path()) {
            return Err(LxkitError::Config {
                message: format!(
                    "{} is not a container directory under {}",
                    dir.display(),
                    root.display()
                ),
            });
        }
        Ok(dir)
    }

    fn cgroup(&self) -> Result<CgroupAccessor> {
        let pid = self.init_pid().ok_or_else(|| LxkitError::NotFound {
            kind: "cgroup",
            id: self.name.clone(),
        })?;
        CgroupAccessor::for_pid(Path::new(PROC_ROOT), Path::new(CGROUP_ROOT), pid)
    }
}

impl EngineContainer for LxcContainer {
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
        self.config_file().is_file()
    }

    fn state(&self) -> ContainerState {
        if !self.is_defined() {
            return ContainerState::Undefined;
        }
        match self.run("lxc-info", "state", ["-s", "-H"]) {
            Ok(out) => out.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(name = %self.name, output = out.trim(), "unrecognised state");
                ContainerState::Undefined
            }),
            Err(e) => {
                tracing::debug!(name = %self.name, error = %e, "state query failed");
                ContainerState::Undefined
            }
        }
    }

    fn init_pid(&self) -> Option<i32> {
        let out = self.run("lxc-info", "init_pid", ["-p", "-H"]).ok()?;
        parse_pid(&out).filter(|pid| process_alive(*pid))
    }

    fn create(&self, request: &CreateRequest) -> Result<()> {
        let mut extra = vec!["-t".to_owned(), request.template.clone(), "--".to_owned()];
        extra.extend(request.template_args());
        let _ = self.run("lxc-create", "create", extra)?;
        self.reload_persisted();
        Ok(())
    }

    fn start(&self, use_init: bool, daemonize: bool) -> Result<()> {
        let tool = if use_init { "lxc-execute" } else { "lxc-start" };
        let mut extra = vec![if daemonize { "-d" } else { "-F" }];
        if use_init {
            extra.extend(["--", INIT_PATH]);
        }

        if daemonize {
            let _ = self.run(tool, "start", extra)?;
            return Ok(());
        }

        // Foreground: the tool lives as long as init does.
        let output = self
            .tools
            .command(tool)?
            .args(self.args(extra))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .and_then(std::process::Child::wait_with_output)
            .map_err(|e| LxkitError::io(tool, e))?;
        tracing::debug!(name = %self.name, status = %output.status, "foreground init exited");
        check_exit(tool, "start", &self.name, &output)
    }

    fn stop(&self) -> Result<()> {
        let _ = self.run("lxc-stop", "stop", ["-k"])?;
        Ok(())
    }

    fn shutdown(&self, timeout: Duration) -> Result<()> {
        let secs = timeout_secs(timeout).to_string();
        let started = Instant::now();
        match self.run("lxc-stop", "shutdown", ["-t", secs.as_str(), "--nokill"]) {
            Ok(_) => Ok(()),
            // lxc-stop also exits non-zero when init outlives the timeout;
            // the caller observes that through the state.
            Err(e @ LxkitError::Engine { .. }) if started.elapsed() >= timeout => {
                tracing::debug!(name = %self.name, error = %e, "clean shutdown not confirmed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn reboot(&self) -> Result<()> {
        let _ = self.run("lxc-stop", "reboot", ["-r"])?;
        Ok(())
    }

    fn freeze(&self) -> Result<()> {
        let _ = self.run("lxc-freeze", "freeze", std::iter::empty::<String>())?;
        Ok(())
    }

    fn unfreeze(&self) -> Result<()> {
        let _ = self.run("lxc-unfreeze", "unfreeze", std::iter::empty::<String>())?;
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        validate_name(&self.name)?;
        let dir = self.dir();
        if self.is_defined() {
            let _ = self.run("lxc-destroy", "destroy", std::iter::empty::<String>())?;
        } else if dir.exists() {
            // A failed template leaves a rootfs without a config, which the
            // tools refuse to touch.
            let dir = self.partial_dir()?;
            tracing::info!(name = %self.name, path = %dir.display(), "removing partial container");
            std::fs::remove_dir_all(&dir).map_err(|e| LxkitError::io(&dir, e))?;
        } else {
            return Err(LxkitError::NotDefined {
                name: self.name.clone(),
            });
        }
        *self.store() = ConfigStore::new();
        Ok(())
    }

    fn clone_to(&self, new_name: &str, backend: CloneBackend) -> Result<()> {
        let _ = self.run("lxc-copy", "clone", copy_args(new_name, backend))?;
        Ok(())
    }

    fn load_config(&self, path: &Path) -> Result<()> {
        *self.store() = ConfigStore::load(path)?;
        Ok(())
    }

    fn save_config(&self, path: &Path) -> Result<()> {
        let store = self.store().clone();
        store.save(path)
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
        self.cgroup()?.read(key)
    }

    fn set_cgroup_item(&self, key: &str, value: &str) -> Result<()> {
        self.cgroup()?.write(key, value)
    }

    fn num_network_interfaces(&self) -> usize {
        self.store().network_interfaces()
    }

    fn release(&self) {
        tracing::trace!(name = %self.name, "lxc binding released");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    use tempfile::TempDir;

    use super::*;
    use crate::registry::ContainerRegistry;

    fn engine_without_tools() -> LxcToolsEngine {
        LxcToolsEngine {
            tools: Arc::new(Tools {
                dir: Some(PathBuf::from("/nonexistent")),
            }),
        }
    }

    /// Installs shell scripts standing in for the `lxc-*` tools. Each one
    /// is called as `<tool> -n <name> -P <root> ...`.
    fn fake_tools(scripts: &[(&str, &str)]) -> (TempDir, LxcToolsEngine) {
        let dir = tempfile::tempdir().unwrap();
        let mut scripts = scripts.to_vec();
        if !scripts.iter().any(|(tool, _)| *tool == PROBE_TOOL) {
            scripts.push((PROBE_TOOL, "exit 0"));
        }
        for (tool, body) in scripts {
            let path = dir.path().join(tool);
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        let engine = LxcToolsEngine::new(&RuntimeConfig {
            lxc_path: Some(dir.path().to_path_buf()),
            ..RuntimeConfig::default()
        })
        .unwrap();
        (dir, engine)
    }

    /// A config root holding a defined `web` container.
    fn root_with_web() -> TempDir {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("web")).unwrap();
        fs::write(root.path().join("web/config"), "lxc.utsname = web\n").unwrap();
        root
    }

    fn engine_message(result: Result<()>) -> (&'static str, String) {
        match result {
            Err(LxkitError::Engine {
                operation, message, ..
            }) => (operation, message),
            other => panic!("expected engine failure, got {other:?}"),
        }
    }

    #[test]
    fn new_reports_missing_tool() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            lxc_path: Some(dir.path().to_path_buf()),
            ..RuntimeConfig::default()
        };
        let err = LxcToolsEngine::new(&config).unwrap_err();
        assert!(err.to_string().contains(PROBE_TOOL));

        fs::write(dir.path().join(PROBE_TOOL), "").unwrap();
        assert!(LxcToolsEngine::new(&config).is_ok());
    }

    #[test]
    fn lists_directories_holding_a_config() {
        let root = tempfile::tempdir().unwrap();
        for name in ["web", "db"] {
            fs::create_dir_all(root.path().join(name)).unwrap();
            fs::write(root.path().join(name).join("config"), "lxc.utsname = x\n").unwrap();
        }
        fs::create_dir_all(root.path().join("partial/rootfs")).unwrap();
        assert_eq!(list_defined_under(root.path()).unwrap(), vec!["db", "web"]);
        assert!(list_defined_under(&root.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn undefined_container_skips_the_tools() {
        let root = tempfile::tempdir().unwrap();
        let c = engine_without_tools().open("ghost", root.path());
        assert!(!c.is_defined());
        assert_eq!(c.state(), ContainerState::Undefined);
        assert!(c.init_pid().is_none());
    }

    #[test]
    fn config_items_come_from_the_persisted_file() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("web")).unwrap();
        fs::write(
            root.path().join("web/config"),
            "lxc.utsname = web\nlxc.network.type = veth\nlxc.network.link = br0\n",
        )
        .unwrap();

        let c = engine_without_tools().open("web", root.path());
        assert!(c.is_defined());
        assert_eq!(c.config_item("lxc.utsname"), vec!["web"]);
        assert_eq!(c.num_network_interfaces(), 1);

        c.set_config_item("lxc.start.auto", "1").unwrap();
        let copy = root.path().join("copy.conf");
        c.save_config(&copy).unwrap();
        c.clear_config_item("lxc.start.auto").unwrap();
        assert!(c.config_item("lxc.start.auto").is_empty());
        c.load_config(&copy).unwrap();
        assert_eq!(c.config_item("lxc.start.auto"), vec!["1"]);
    }

    #[test]
    fn destroy_removes_partial_leftovers() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("half/rootfs/etc")).unwrap();
        let c = engine_without_tools().open("half", root.path());
        c.destroy().unwrap();
        assert!(!root.path().join("half").exists());
        assert!(matches!(c.destroy(), Err(LxkitError::NotDefined { .. })));
    }

    #[test]
    fn destroy_never_leaves_the_config_root() {
        let host = tempfile::tempdir().unwrap();
        let root = host.path().join("lxc");
        fs::create_dir_all(root.join("web")).unwrap();
        fs::write(root.join("web/config"), "lxc.utsname = web\n").unwrap();
        fs::create_dir_all(host.path().join("victim/data")).unwrap();
        std::os::unix::fs::symlink(host.path().join("victim"), root.join("link")).unwrap();

        let engine = engine_without_tools();
        for name in ["", ".", "..", "../victim", "link"] {
            let result = engine.open(name, &root).destroy();
            assert!(
                matches!(result, Err(LxkitError::Config { .. })),
                "{name:?}: {result:?}"
            );
        }
        assert!(root.join("web/config").is_file());
        assert!(host.path().join("victim/data").is_dir());
    }

    #[test]
    fn cgroup_of_stopped_container_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let c = engine_without_tools().open("ghost", root.path());
        assert!(matches!(
            c.cgroup_item("memory.usage_in_bytes"),
            Err(LxkitError::NotFound { kind: "cgroup", .. })
        ));
    }

    #[test]
    fn helpers_format_tool_arguments() {
        assert_eq!(parse_pid("4242\n"), Some(4242));
        assert_eq!(parse_pid("-1"), None);
        assert_eq!(parse_pid(""), None);
        assert_eq!(timeout_secs(Duration::from_millis(1500)), 2);
        assert_eq!(timeout_secs(Duration::ZERO), 0);
        assert_eq!(copy_args("b", CloneBackend::Directory), vec!["-N", "b", "-B", "dir"]);
        assert_eq!(copy_args("b", CloneBackend::Overlayfs).last().unwrap(), "-s");
    }

    #[test]
    fn start_passes_name_root_and_mode() {
        let record = r#"printf '%s\n' "$*" > "$4/args""#;
        let (_tools, engine) = fake_tools(&[(PROBE_TOOL, record), ("lxc-execute", record)]);
        let root = root_with_web();
        let c = engine.open("web", root.path());
        let args = || fs::read_to_string(root.path().join("args")).unwrap();
        let prefix = format!("-n web -P {}", root.path().display());

        c.start(false, true).unwrap();
        assert_eq!(args().trim(), format!("{prefix} -d"));
        c.start(true, true).unwrap();
        assert_eq!(args().trim(), format!("{prefix} -d -- {INIT_PATH}"));
        c.start(false, false).unwrap();
        assert_eq!(args().trim(), format!("{prefix} -F"));
    }

    #[test]
    fn start_failure_carries_tool_stderr() {
        let (_tools, engine) =
            fake_tools(&[(PROBE_TOOL, "echo 'failed to spawn init' >&2; exit 1")]);
        let root = root_with_web();
        let c = engine.open("web", root.path());

        for daemonize in [true, false] {
            let (operation, message) = engine_message(c.start(false, daemonize));
            assert_eq!(operation, "start");
            assert_eq!(message, "failed to spawn init", "daemonize={daemonize}");
        }
    }

    #[test]
    fn silent_foreground_failure_reports_exit_status() {
        let (_tools, engine) = fake_tools(&[(PROBE_TOOL, "exit 3")]);
        let root = root_with_web();
        let c = engine.open("web", root.path());
        let (_, message) = engine_message(c.start(false, false));
        assert!(message.contains("exited with"), "{message}");
    }

    #[test]
    fn failing_foreground_start_through_a_handle_is_an_error() {
        let (_tools, engine) = fake_tools(&[(PROBE_TOOL, "exit 1"), ("lxc-info", "echo STOPPED")]);
        let root = root_with_web();
        let registry = ContainerRegistry::new(
            Arc::new(engine),
            RuntimeConfig {
                config_path: root.path().to_path_buf(),
                ..RuntimeConfig::default()
            },
        );
        let web = registry.acquire("web");
        assert_eq!(web.state(), ContainerState::Stopped);
        web.set_daemonize(false);
        assert!(matches!(web.start(false), Err(LxkitError::Engine { .. })));
    }

    #[test]
    fn stop_failure_carries_tool_stderr() {
        let (_tools, engine) = fake_tools(&[("lxc-stop", "echo 'web is not running' >&2; exit 2")]);
        let root = root_with_web();
        let (operation, message) = engine_message(engine.open("web", root.path()).stop());
        assert_eq!(operation, "stop");
        assert_eq!(message, "web is not running");
    }

    #[test]
    fn undelivered_shutdown_fails_without_waiting() {
        let (_tools, engine) =
            fake_tools(&[("lxc-stop", "echo 'Operation not permitted' >&2; exit 1")]);
        let root = root_with_web();
        let c = engine.open("web", root.path());

        let started = Instant::now();
        let (operation, message) = engine_message(c.shutdown(Duration::from_secs(5)));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(operation, "shutdown");
        assert_eq!(message, "Operation not permitted");
    }

    #[test]
    fn shutdown_outlasting_the_timeout_is_left_to_the_caller() {
        let (_tools, engine) = fake_tools(&[("lxc-stop", "sleep 1; exit 1")]);
        let root = root_with_web();
        engine
            .open("web", root.path())
            .shutdown(Duration::from_secs(1))
            .unwrap();
    }

    #[test]
    fn shutdown_without_lxc_stop_is_not_found() {
        let (_tools, engine) = fake_tools(&[]);
        let root = root_with_web();
        assert!(matches!(
            engine.open("web", root.path()).shutdown(Duration::from_secs(1)),
            Err(LxkitError::NotFound {
                kind: "lxc tool",
                ..
            })
        ));
    }

    #[test]
    fn destroy_of_defined_container_runs_lxc_destroy() {
        let (_tools, engine) = fake_tools(&[("lxc-destroy", r#"rm -r "$4/$2""#)]);
        let root = root_with_web();
        let c = engine.open("web", root.path());
        assert_eq!(c.config_item("lxc.utsname"), vec!["web"]);

        c.destroy().unwrap();
        assert!(!root.path().join("web").exists());
        assert!(c.config_item("lxc.utsname").is_empty());
    }

    #[test]
    fn failed_lxc_destroy_keeps_the_container() {
        let (_tools, engine) = fake_tools(&[("lxc-destroy", "echo 'device busy' >&2; exit 1")]);
        let root = root_with_web();
        let c = engine.open("web", root.path());

        let (operation, message) = engine_message(c.destroy());
        assert_eq!((operation, message.as_str()), ("destroy", "device busy"));
        assert!(c.is_defined());
        assert_eq!(c.config_item("lxc.utsname"), vec!["web"]);
    }

    #[test]
    fn state_comes_from_lxc_info() {
        let (_tools, engine) = fake_tools(&[("lxc-info", "echo FROZEN")]);
        let root = root_with_web();
        assert_eq!(engine.open("web", root.path()).state(), ContainerState::Frozen);
    }
}
