//! Memory accounting keys and value parsing.
//!
//! Callers address memory control files by their legacy (v1) names. On a
//! unified hierarchy those names are translated to the v2 equivalents.

use lxkit_common::error::{LxkitError, Result};
use lxkit_common::types::ByteSize;

/// Current memory usage.
pub const USAGE: &str = "memory.usage_in_bytes";
/// Peak memory usage.
pub const MAX_USAGE: &str = "memory.max_usage_in_bytes";
/// Hard memory limit.
pub const LIMIT: &str = "memory.limit_in_bytes";
/// Soft memory limit.
pub const SOFT_LIMIT: &str = "memory.soft_limit_in_bytes";
/// Memory plus swap usage.
pub const SWAP_USAGE: &str = "memory.memsw.usage_in_bytes";
/// Memory plus swap limit.
pub const SWAP_LIMIT: &str = "memory.memsw.limit_in_bytes";

/// Returns the unified-hierarchy name for a legacy memory key.
///
/// The v2 swap files account swap alone rather than memory plus swap.
pub fn unified_name(key: &str) -> Option<&'static str> {
    match key {
        USAGE => Some("memory.current"),
        MAX_USAGE => Some("memory.peak"),
        LIMIT => Some("memory.max"),
        SOFT_LIMIT => Some("memory.low"),
        SWAP_USAGE => Some("memory.swap.current"),
        SWAP_LIMIT => Some("memory.swap.max"),
        _ => None,
    }
}

/// Parses the first value of a byte-count control file.
///
/// `max` (the v2 spelling of "unlimited") maps to `u64::MAX`.
///
/// # Errors
///
/// Returns an error if no value was read or it is not an integer.
pub fn parse_bytes(key: &str, values: &[String]) -> Result<ByteSize> {
    let raw = values.first().map(|v| v.trim()).ok_or_else(|| LxkitError::NotFound {
        kind: "cgroup value",
        id: key.to_owned(),
    })?;
    if raw == "max" {
        return Ok(ByteSize::new(u64::MAX));
    }
    raw.parse::<u64>()
        .map(ByteSize::new)
        .map_err(|e| LxkitError::Config {
            message: format!("{key}: cannot parse `{raw}` as bytes: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_translates_to_memory_max() {
        assert_eq!(unified_name(LIMIT), Some("memory.max"));
        assert_eq!(unified_name("cpu.shares"), None);
    }

    #[test]
    fn parse_bytes_reads_first_line() {
        let values = vec!["9223372036854771712".to_owned()];
        assert_eq!(
            parse_bytes(LIMIT, &values).unwrap().as_u64(),
            9_223_372_036_854_771_712
        );
    }

    #[test]
    fn parse_bytes_maps_max_to_unlimited() {
        let values = vec!["max".to_owned()];
        assert_eq!(parse_bytes(LIMIT, &values).unwrap().as_u64(), u64::MAX);
    }

    #[test]
    fn parse_bytes_rejects_empty_and_garbage() {
        assert!(parse_bytes(USAGE, &[]).is_err());
        assert!(parse_bytes(USAGE, &["12k".to_owned()]).is_err());
    }
}
