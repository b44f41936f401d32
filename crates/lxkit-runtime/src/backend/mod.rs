//! Engine implementations and host detection.

pub mod lxc;
pub mod memory;

use std::sync::Arc;

use lxkit_common::config::RuntimeConfig;
use lxkit_common::error::{LxkitError, Result};

use crate::engine::Engine;

/// Returns the engine installed on this host.
///
/// There is no silent fallback: callers that want a simulated host build
/// a [`memory::MemoryEngine`] explicitly.
///
/// # Errors
///
/// Returns [`LxkitError::NotFound`] naming the missing `lxc-*` binary.
pub fn detect_engine(config: &RuntimeConfig) -> Result<Arc<dyn Engine>> {
    let engine = lxc::LxcToolsEngine::new(config)?;
    tracing::info!(version = %engine.version(), "using lxc tools engine");
    Ok(Arc::new(engine))
}

/// Rejects keys the config file format cannot represent.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains(char::is_whitespace) || key.contains('=') {
        return Err(LxkitError::Config {
            message: format!("invalid config key `{key}`"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_fails_without_tools() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            lxc_path: Some(dir.path().to_path_buf()),
            ..RuntimeConfig::default()
        };
        let err = detect_engine(&config).err().unwrap();
        assert!(matches!(err, LxkitError::NotFound { kind: "lxc tool", .. }));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(validate_key("lxc.utsname").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("lxc.bad key").is_err());
        assert!(validate_key("a=b").is_err());
    }
}
