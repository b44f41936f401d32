//! Cgroup control-file access.
//!
//! [`CgroupAccessor`] reads and writes the control files of one
//! container's cgroups, addressed by leaf name (`memory.limit_in_bytes`).
//! Values are returned as text lines and never interpreted here: limits
//! can exceed what a caller's numeric type holds, so parsing is left to
//! whoever needs the number.

pub mod hierarchy;
pub mod memory;

use std::path::{Path, PathBuf};

use lxkit_common::error::{LxkitError, Result};

use self::hierarchy::Hierarchy;

/// Control files a caller may write. Everything else is read-only.
pub const WRITABLE_KEYS: &[&str] = &[
    memory::LIMIT,
    memory::SOFT_LIMIT,
    memory::SWAP_LIMIT,
    "memory.max",
    "memory.high",
    "memory.low",
    "memory.swap.max",
    "cpu.shares",
    "cpu.weight",
    "cpu.max",
    "cpu.cfs_quota_us",
    "cpu.cfs_period_us",
    "cpuset.cpus",
    "cpuset.mems",
    "blkio.weight",
    "io.weight",
    "pids.max",
];

/// Returns true if `key` may be written through [`CgroupAccessor::write`].
pub fn is_writable(key: &str) -> bool {
    WRITABLE_KEYS.contains(&key)
}

/// Read/write handle on one container's cgroup control files.
#[derive(Debug, Clone)]
pub struct CgroupAccessor {
    hierarchy: Hierarchy,
}

impl CgroupAccessor {
    /// Wraps an already discovered hierarchy.
    pub const fn new(hierarchy: Hierarchy) -> Self {
        Self { hierarchy }
    }

    /// Builds an accessor for the cgroups `pid` belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the process' cgroup membership cannot be read.
    pub fn for_pid(proc_root: &Path, cgroup_root: &Path, pid: i32) -> Result<Self> {
        Hierarchy::for_pid(proc_root, cgroup_root, pid).map(Self::new)
    }

    /// Reads a control file, one entry per non-empty line.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller is not mounted for this container
    /// or the file cannot be read.
    pub fn read(&self, key: &str) -> Result<Vec<String>> {
        let path = self.resolve(key)?;
        let text = std::fs::read_to_string(&path).map_err(|e| LxkitError::io(&path, e))?;
        tracing::debug!(key, path = %path.display(), "cgroup read");
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect())
    }

    /// Writes a control file.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not writable, the controller is not
    /// mounted, or the kernel rejects the value.
    pub fn write(&self, key: &str, value: &str) -> Result<()> {
        if !is_writable(key) {
            return Err(LxkitError::Config {
                message: format!("cgroup key {key} is read-only"),
            });
        }
        let path = self.resolve(key)?;
        std::fs::write(&path, value).map_err(|e| LxkitError::io(&path, e))?;
        tracing::debug!(key, value, path = %path.display(), "cgroup written");
        Ok(())
    }

    /// Maps a control-file name to its path on this host's hierarchy.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let controller = key
            .split_once('.')
            .map(|(controller, _)| controller)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LxkitError::Config {
                message: format!("invalid cgroup key: {key}"),
            })?;
        let dir = self
            .hierarchy
            .directory(controller)
            .ok_or_else(|| LxkitError::NotFound {
                kind: "cgroup controller",
                id: controller.to_owned(),
            })?;
        let leaf = if self.hierarchy.uses_unified(controller) {
            memory::unified_name(key).unwrap_or(key)
        } else {
            key
        };
        Ok(dir.join(leaf))
    }
}
