//! Domain primitive types used across the lxkit workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LxkitError;

/// Lifecycle state of a container as reported by the engine.
///
/// `Undefined` is a sentinel for names with no persisted configuration;
/// the engine itself never reports it for a defined container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContainerState {
    /// No persisted configuration exists for this name.
    Undefined,
    /// Defined and not running.
    Stopped,
    /// Init process is being spawned.
    Starting,
    /// Init process is up.
    Running,
    /// Processes are being terminated.
    Stopping,
    /// Startup failed and the container is being torn down.
    Aborting,
    /// Processes are being suspended.
    Freezing,
    /// All processes are suspended.
    Frozen,
    /// Processes were resumed and the container is returning to `Running`.
    Thawed,
}

impl ContainerState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Undefined,
        Self::Stopped,
        Self::Starting,
        Self::Running,
        Self::Stopping,
        Self::Aborting,
        Self::Freezing,
        Self::Frozen,
        Self::Thawed,
    ];

    /// Returns the engine's textual name for this state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "UNDEFINED",
            Self::Stopped => "STOPPED",
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Aborting => "ABORTING",
            Self::Freezing => "FREEZING",
            Self::Frozen => "FROZEN",
            Self::Thawed => "THAWED",
        }
    }

    /// Returns true while the container has a live init process.
    ///
    /// Frozen and transitional states count as active: the processes exist,
    /// they are just suspended or changing state.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Undefined | Self::Stopped)
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ContainerState {
    type Err = LxkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LxkitError::Config {
                message: format!("unknown container state: {wanted}"),
            })
    }
}

/// Storage strategy used to materialise a cloned container's filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneBackend {
    /// Full copy into a plain directory.
    Directory,
    /// Copy-on-write overlay on top of the source's rootfs.
    Overlayfs,
    /// Btrfs subvolume snapshot.
    Btrfs,
    /// LVM logical volume.
    Lvm,
    /// ZFS dataset clone.
    Zfs,
    /// Loop-mounted image file.
    Loop,
    /// Let the engine pick the best available backend.
    Best,
}

impl CloneBackend {
    /// Returns the engine's backing-store name for this variant.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "dir",
            Self::Overlayfs => "overlayfs",
            Self::Btrfs => "btrfs",
            Self::Lvm => "lvm",
            Self::Zfs => "zfs",
            Self::Loop => "loop",
            Self::Best => "best",
        }
    }

    /// Returns true when the clone shares its lower layers with the source.
    pub const fn is_snapshot(self) -> bool {
        matches!(self, Self::Overlayfs | Self::Btrfs | Self::Zfs)
    }
}

impl fmt::Display for CloneBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CloneBackend {
    type Err = LxkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dir" | "directory" => Ok(Self::Directory),
            "overlay" | "overlayfs" => Ok(Self::Overlayfs),
            "btrfs" => Ok(Self::Btrfs),
            "lvm" => Ok(Self::Lvm),
            "zfs" => Ok(Self::Zfs),
            "loop" => Ok(Self::Loop),
            "best" => Ok(Self::Best),
            other => Err(LxkitError::Config {
                message: format!("unknown clone backend: {other}"),
            }),
        }
    }
}

/// A byte count read from a cgroup accounting file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteSize(u64);

impl ByteSize {
    /// Wraps a raw byte count.
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Returns the raw byte count.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for ByteSize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ByteSize {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const KIB: u64 = 1024;
        const MIB: u64 = KIB * 1024;
        const GIB: u64 = MIB * 1024;
        const TIB: u64 = GIB * 1024;

        let bytes = self.0;
        if bytes >= TIB {
            write!(f, "{:.1} TiB", bytes as f64 / TIB as f64)
        } else if bytes >= GIB {
            write!(f, "{:.1} GiB", bytes as f64 / GIB as f64)
        } else if bytes >= MIB {
            write!(f, "{:.1} MiB", bytes as f64 / MIB as f64)
        } else if bytes >= KIB {
            write!(f, "{:.1} KiB", bytes as f64 / KIB as f64)
        } else {
            write!(f, "{bytes} B")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_parses_engine_output() {
        assert_eq!(
            "RUNNING".parse::<ContainerState>().unwrap(),
            ContainerState::Running
        );
        assert_eq!(
            " frozen\n".parse::<ContainerState>().unwrap(),
            ContainerState::Frozen
        );
        assert!("SLEEPING".parse::<ContainerState>().is_err());
    }

    #[test]
    fn only_stopped_and_undefined_are_inactive() {
        let inactive: Vec<_> = ContainerState::ALL
            .into_iter()
            .filter(|s| !s.is_active())
            .collect();
        assert_eq!(
            inactive,
            vec![ContainerState::Undefined, ContainerState::Stopped]
        );
    }

    #[test]
    fn clone_backend_accepts_aliases() {
        assert_eq!(
            "overlay".parse::<CloneBackend>().unwrap(),
            CloneBackend::Overlayfs
        );
        assert_eq!("dir".parse::<CloneBackend>().unwrap(), CloneBackend::Directory);
        assert!("tmpfs".parse::<CloneBackend>().is_err());
    }

    #[test]
    fn byte_size_displays_human_units() {
        assert_eq!(ByteSize::new(512).to_string(), "512 B");
        assert_eq!(ByteSize::new(134_217_728).to_string(), "128.0 MiB");
        assert_eq!(ByteSize::new(2_147_483_648).to_string(), "2.0 GiB");
    }
}
