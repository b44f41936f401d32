//! Cgroup hierarchy discovery.
//!
//! A process' cgroup membership is listed in `/proc/<pid>/cgroup`, one
//! line per hierarchy: `<id>:<controllers>:<path>`. Legacy (v1) lines name
//! their controllers (`4:memory:/lxc/web`); the unified (v2) line has id 0
//! and an empty controller list (`0::/lxc.payload.web`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lxkit_common::error::{LxkitError, Result};

/// Where each controller's control files live for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    /// Controller name to its cgroup directory on a legacy hierarchy.
    legacy: HashMap<String, PathBuf>,
    /// Cgroup directory on the unified hierarchy, if the process has one.
    unified: Option<PathBuf>,
}

impl Hierarchy {
    /// Parses the contents of a `/proc/<pid>/cgroup` file.
    ///
    /// `cgroup_root` is the cgroup filesystem mount point the paths are
    /// relative to.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is malformed or no hierarchy is listed.
    pub fn parse(text: &str, cgroup_root: &Path) -> Result<Self> {
        let mut legacy = HashMap::new();
        let mut unified = None;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let mut fields = line.splitn(3, ':');
            let (Some(id), Some(controllers), Some(path)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(LxkitError::Config {
                    message: format!("malformed cgroup line: {line}"),
                });
            };
            let relative = path.trim_start_matches('/');

            if id == "0" && controllers.is_empty() {
                unified = Some(cgroup_root.join(relative));
                continue;
            }

            // Co-mounted controllers share one directory named after all of them.
            let mount = controllers.strip_prefix("name=").unwrap_or(controllers);
            let dir = cgroup_root.join(mount).join(relative);
            for controller in controllers.split(',') {
                let controller = controller.strip_prefix("name=").unwrap_or(controller);
                let _ = legacy.insert(controller.to_owned(), dir.clone());
            }
        }

        if legacy.is_empty() && unified.is_none() {
            return Err(LxkitError::Config {
                message: "cgroup membership lists no hierarchy".into(),
            });
        }
        Ok(Self { legacy, unified })
    }

    /// Reads `<proc_root>/<pid>/cgroup` and parses it.
    ///
    /// # Errors
    ///
    /// Returns an error if the process does not exist or the file is malformed.
    pub fn for_pid(proc_root: &Path, cgroup_root: &Path, pid: i32) -> Result<Self> {
        let path = proc_root.join(pid.to_string()).join("cgroup");
        let text = std::fs::read_to_string(&path).map_err(|e| LxkitError::io(&path, e))?;
        Self::parse(&text, cgroup_root)
    }

    /// Returns true when control files must be addressed by their v2 names.
    pub fn uses_unified(&self, controller: &str) -> bool {
        !self.legacy.contains_key(controller) && self.unified.is_some()
    }

    /// Returns the directory holding `controller`'s control files.
    pub fn directory(&self, controller: &str) -> Option<&Path> {
        self.legacy
            .get(controller)
            .or(self.unified.as_ref())
            .map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = "\
12:pids:/lxc/web
4:memory:/lxc/web
3:cpu,cpuacct:/lxc/web
1:name=systemd:/lxc/web
";

    #[test]
    fn legacy_controllers_map_to_their_mounts() {
        let h = Hierarchy::parse(LEGACY, Path::new("/sys/fs/cgroup")).unwrap();
        assert_eq!(
            h.directory("memory"),
            Some(Path::new("/sys/fs/cgroup/memory/lxc/web"))
        );
        assert_eq!(
            h.directory("cpuacct"),
            Some(Path::new("/sys/fs/cgroup/cpu,cpuacct/lxc/web"))
        );
        assert_eq!(
            h.directory("systemd"),
            Some(Path::new("/sys/fs/cgroup/systemd/lxc/web"))
        );
        assert!(!h.uses_unified("memory"));
        assert!(h.directory("blkio").is_none());
    }

    #[test]
    fn unified_line_serves_every_controller() {
        let h = Hierarchy::parse("0::/lxc.payload.web\n", Path::new("/sys/fs/cgroup")).unwrap();
        assert_eq!(
            h.directory("memory"),
            Some(Path::new("/sys/fs/cgroup/lxc.payload.web"))
        );
        assert!(h.uses_unified("memory"));
    }

    #[test]
    fn hybrid_prefers_legacy_controllers() {
        let text = "4:memory:/lxc/web\n0::/lxc/web\n";
        let h = Hierarchy::parse(text, Path::new("/cg")).unwrap();
        assert!(!h.uses_unified("memory"));
        assert!(h.uses_unified("pids"));
        assert_eq!(h.directory("pids"), Some(Path::new("/cg/lxc/web")));
    }

    #[test]
    fn malformed_line_is_rejected() {
        assert!(Hierarchy::parse("garbage\n", Path::new("/cg")).is_err());
        assert!(Hierarchy::parse("", Path::new("/cg")).is_err());
    }

    #[test]
    fn for_pid_reads_proc_file() {
        let proc_root = tempfile::tempdir().unwrap();
        let pid_dir = proc_root.path().join("4242");
        std::fs::create_dir_all(&pid_dir).unwrap();
        std::fs::write(pid_dir.join("cgroup"), "0::/lxc.payload.web\n").unwrap();

        let h = Hierarchy::for_pid(proc_root.path(), Path::new("/cg"), 4242).unwrap();
        assert_eq!(h.directory("memory"), Some(Path::new("/cg/lxc.payload.web")));
        assert!(Hierarchy::for_pid(proc_root.path(), Path::new("/cg"), 1).is_err());
    }
}
