//! Formatted output helpers for CLI commands.
//!
//! Tables are rendered to a `String` so the formatting can be tested
//! without capturing stdout.

use std::fmt::Write as _;

use lxkit_common::types::{ByteSize, ContainerState};
use lxkit_runtime::Container;
use serde::Serialize;

/// One container as shown by `lxk ls` and `lxk info`.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerRow {
    /// Container name.
    pub name: String,
    /// Lifecycle state.
    pub state: ContainerState,
    /// Init PID while active.
    pub pid: Option<i32>,
    /// Configured network interfaces.
    pub interfaces: usize,
    /// Memory in use, when the container is active and accounted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<ByteSize>,
    /// Memory limit, when the container is active and accounted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<ByteSize>,
}

impl ContainerRow {
    /// Snapshots `container`; memory accounting is best effort.
    pub fn capture(container: &Container) -> Self {
        let state = container.state();
        let (memory, memory_limit) = if state.is_active() {
            (
                container.memory_usage_in_bytes().ok(),
                container.memory_limit_in_bytes().ok(),
            )
        } else {
            (None, None)
        };
        Self {
            name: container.name().to_owned(),
            state,
            pid: container.init_pid(),
            interfaces: container.number_of_network_interfaces(),
            memory,
            memory_limit,
        }
    }
}

fn dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

/// Renders rows as an aligned table with a header line.
pub fn render_table(rows: &[ContainerRow]) -> String {
    let width = rows
        .iter()
        .map(|r| r.name.len())
        .chain(std::iter::once("NAME".len()))
        .max()
        .unwrap_or(4);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$}  {:<9} {:<8} {:<5} {:<12}",
        "NAME", "STATE", "PID", "NICS", "MEMORY"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<width$}  {:<9} {:<8} {:<5} {:<12}",
            row.name,
            row.state,
            dash(row.pid),
            row.interfaces,
            dash(row.memory),
        );
    }
    out
}

/// Renders one row as `key: value` lines.
pub fn render_details(row: &ContainerRow) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name:        {}", row.name);
    let _ = writeln!(out, "State:       {}", row.state);
    let _ = writeln!(out, "PID:         {}", dash(row.pid));
    let _ = writeln!(out, "Interfaces:  {}", row.interfaces);
    let _ = writeln!(out, "Memory:      {}", dash(row.memory));
    let _ = writeln!(out, "Mem limit:   {}", dash(row.memory_limit));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, state: ContainerState, pid: Option<i32>) -> ContainerRow {
        ContainerRow {
            name: name.to_owned(),
            state,
            pid,
            interfaces: 1,
            memory: pid.map(|_| ByteSize::new(128 * 1024 * 1024)),
            memory_limit: None,
        }
    }

    #[test]
    fn table_aligns_to_longest_name() {
        let table = render_table(&[
            row("web", ContainerState::Running, Some(4242)),
            row("database", ContainerState::Stopped, None),
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAME      STATE"));
        assert!(lines[1].starts_with("web       RUNNING   4242"));
        assert!(lines[2].contains("STOPPED   -"));
    }

    #[test]
    fn details_show_dash_for_missing_values() {
        let text = render_details(&row("web", ContainerState::Stopped, None));
        assert!(text.contains("PID:         -"));
        assert!(text.contains("Mem limit:   -"));
    }

    #[test]
    fn json_omits_missing_memory() {
        let json = serde_json::to_value(row("web", ContainerState::Stopped, None)).unwrap();
        assert!(json.get("memory").is_none());
        assert_eq!(json["name"], "web");
    }
}
