//! System-wide constants and default paths.

use std::path::{Path, PathBuf};

use crate::error::{LxkitError, Result};

/// Default root under which `<name>/config` files live.
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/lxc";

/// File name of a container's persisted configuration inside its directory.
pub const CONFIG_FILE_NAME: &str = "config";

/// Environment variable overriding the default config root.
pub const CONFIG_PATH_ENV: &str = "LXKIT_CONFIG_PATH";

/// Environment variable naming the directory that holds the `lxc-*` tools.
pub const LXC_PATH_ENV: &str = "LXKIT_LXC_PATH";

/// Init PID reported for a container that is not running.
pub const UNDEFINED_PID: i32 = -1;

/// Cgroup filesystem mount point.
pub const CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Proc filesystem mount point.
pub const PROC_ROOT: &str = "/proc";

/// Version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name used in CLI output.
pub const APP_NAME: &str = "lxkit";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "lxk";

/// Returns the default config root.
pub fn default_config_path() -> &'static Path {
    Path::new(DEFAULT_CONFIG_PATH)
}

/// Returns `<config_path>/<name>/config`.
pub fn config_file_name(config_path: &Path, name: &str) -> PathBuf {
    config_path.join(name).join(CONFIG_FILE_NAME)
}

/// Checks that `name` addresses a single directory directly under a
/// config root.
///
/// # Errors
///
/// Returns [`LxkitError::Config`] for an empty name, `.`, `..`, or a name
/// containing `/` or NUL.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name == "." || name == ".." {
        "must not be a relative directory"
    } else if name.contains(['/', '\0']) {
        "must not contain '/' or NUL"
    } else {
        return Ok(());
    };
    Err(LxkitError::Config {
        message: format!("invalid container name {name:?}: {reason}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_lives_under_container_directory() {
        assert_eq!(
            config_file_name(default_config_path(), "rubik"),
            PathBuf::from("/var/lib/lxc/rubik/config")
        );
    }

    #[test]
    fn names_must_stay_inside_the_root() {
        for name in ["web", "web-01", "a.b", "..hidden"] {
            assert!(validate_name(name).is_ok(), "{name}");
        }
        for name in ["", ".", "..", "../victim", "a/b", "/abs", "nul\0byte"] {
            assert!(
                matches!(validate_name(name), Err(LxkitError::Config { .. })),
                "{name:?}"
            );
        }
    }
}
