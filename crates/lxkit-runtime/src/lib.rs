//! # lxkit-runtime
//!
//! Container lifecycle management on top of an LXC-style engine.
//!
//! - [`registry::ContainerRegistry`] hands out [`container::Container`]
//!   handles, keeping exactly one engine binding per name alive while any
//!   handle to it exists.
//! - [`container::Container`] enforces the lifecycle state machine and
//!   forwards operations to the engine.
//! - [`wait::StateWaiter`] turns asynchronous transitions into bounded
//!   waits.
//! - [`backend`] holds the engines: the `lxc-*` tools on a real host and
//!   an in-process simulation.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use lxkit_common::config::RuntimeConfig;
//! use lxkit_common::types::ContainerState;
//! use lxkit_runtime::registry::ContainerRegistry;
//!
//! # fn main() -> lxkit_common::error::Result<()> {
//! let registry = ContainerRegistry::detect(RuntimeConfig::from_env())?;
//! let web = registry.acquire("web");
//! web.create("ubuntu", "amd64", "jammy")?;
//! web.set_daemonize(true);
//! web.start(false)?;
//! assert!(web.wait(ContainerState::Running, Duration::from_secs(30)));
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

use std::path::Path;

use lxkit_common::config::RuntimeConfig;
use lxkit_common::error::Result;

pub mod backend;
pub mod container;
pub mod engine;
pub mod registry;
pub mod wait;

pub use container::Container;
pub use registry::ContainerRegistry;

/// Version string of the engine installed on this host.
///
/// # Errors
///
/// Returns an error if no engine is installed.
pub fn version(config: &RuntimeConfig) -> Result<String> {
    Ok(backend::detect_engine(config)?.version())
}

/// Root under which containers live unless configured otherwise.
pub fn default_config_path() -> &'static Path {
    lxkit_common::constants::default_config_path()
}
