//! In-memory model of a container configuration file.
//!
//! The on-disk format is line oriented: `key = value`, `#` comments and
//! blank lines. A key may repeat, in which case each line contributes one
//! more value. Keys are dotted namespaces (`lxc.network.0.mtu`), so the
//! store can enumerate the children of any prefix.
//!
//! Legacy network blocks are written without an index, with
//! `lxc.network.type` opening each new interface:
//!
//! ```text
//! lxc.network.type = veth
//! lxc.network.link = lxcbr0
//! ```
//!
//! These are normalised to `lxc.network.0.type`, `lxc.network.0.link`, ...
//! on load and written back in the unindexed form on save.

use std::fmt::Write as _;
use std::fs::Permissions;
use std::io::Write as _;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use lxkit_common::error::{LxkitError, Result};

const LEGACY_NETWORK_PREFIX: &str = "lxc.network";
const NETWORK_PREFIXES: [&str; 2] = ["lxc.network", "lxc.net"];

/// Ordered multi-map from config keys to their values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigStore {
    entries: Vec<(String, Vec<String>)>,
}

impl ConfigStore {
    /// Creates an empty store.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parses the textual config format.
    ///
    /// # Errors
    ///
    /// Returns an error naming the line number if a line has no `=` or an
    /// empty or whitespace-containing key.
    pub fn parse(text: &str) -> Result<Self> {
        let mut store = Self::new();
        let mut network_index: Option<usize> = None;

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(LxkitError::Config {
                    message: format!("line {}: expected `key = value`", lineno + 1),
                });
            };
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(LxkitError::Config {
                    message: format!("line {}: invalid key `{key}`", lineno + 1),
                });
            }
            let value = value.trim();

            if key == LEGACY_NETWORK_PREFIX {
                // A bare `lxc.network =` resets the interface list.
                let _ = store.clear(LEGACY_NETWORK_PREFIX);
                network_index = None;
                continue;
            }

            let key = match legacy_network_leaf(key) {
                Some(leaf) => {
                    let index = match network_index {
                        Some(current) if leaf != "type" => current,
                        _ => store.network_interfaces_under(LEGACY_NETWORK_PREFIX),
                    };
                    network_index = Some(index);
                    format!("{LEGACY_NETWORK_PREFIX}.{index}.{leaf}")
                }
                None => key.to_owned(),
            };
            store.append(&key, value);
        }
        Ok(store)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails to parse.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| LxkitError::io(path, e))?;
        let store = Self::parse(&text)?;
        tracing::debug!(path = %path.display(), keys = store.entries.len(), "config loaded");
        Ok(store)
    }

    /// Writes the store to `path`, creating parent directories as needed.
    ///
    /// The file is written to a uniquely named sibling and renamed into
    /// place, so readers never observe a half-written config and concurrent
    /// saves to the same path each publish a whole file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| LxkitError::io(parent, e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".config")
            .permissions(Permissions::from_mode(0o644))
            .tempfile_in(parent)
            .map_err(|e| LxkitError::io(parent, e))?;
        tmp.write_all(self.render().as_bytes())
            .map_err(|e| LxkitError::io(tmp.path(), e))?;
        let _ = tmp.persist(path).map_err(|e| LxkitError::io(path, e.error))?;
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Renders the store in the textual config format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut networks: Vec<(usize, &str, &[String])> = Vec::new();

        for (key, values) in &self.entries {
            if let Some((index, leaf)) = indexed_legacy_network(key) {
                networks.push((index, leaf, values.as_slice()));
                continue;
            }
            for value in values {
                let _ = writeln!(out, "{key} = {value}");
            }
        }

        // `type` must lead each block since it is what opens an interface.
        networks.sort_by_key(|&(index, leaf, _)| (index, leaf != "type"));
        for (_, leaf, values) in networks {
            for value in values {
                let _ = writeln!(out, "{LEGACY_NETWORK_PREFIX}.{leaf} = {value}");
            }
        }
        out
    }

    /// Returns every value stored for `key`, or an empty list.
    pub fn get(&self, key: &str) -> Vec<String> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.clone())
            .unwrap_or_default()
    }

    /// Appends `value` to `key`, keeping any values already present.
    pub fn append(&mut self, key: &str, value: &str) {
        if let Some((_, values)) = self.entries.iter_mut().find(|(k, _)| k == key) {
            values.push(value.to_owned());
        } else {
            self.entries.push((key.to_owned(), vec![value.to_owned()]));
        }
    }

    /// Replaces every value of `key` with `value`.
    pub fn replace(&mut self, key: &str, value: &str) {
        self.entries.retain(|(k, _)| k != key);
        self.append(key, value);
    }

    /// Removes `key` and every key nested under it.
    ///
    /// Returns true if anything was removed.
    pub fn clear(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| !is_same_or_nested(k, key));
        self.entries.len() != before
    }

    /// Lists the distinct direct children of `prefix`, in first-seen order.
    ///
    /// An empty prefix lists the top-level namespaces.
    pub fn keys(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.trim_end_matches('.');
        let mut children: Vec<String> = Vec::new();
        for (key, _) in &self.entries {
            let rest = if prefix.is_empty() {
                key.as_str()
            } else if let Some(rest) = key.strip_prefix(prefix).and_then(|r| r.strip_prefix('.')) {
                rest
            } else {
                continue;
            };
            let child = rest.split('.').next().unwrap_or(rest);
            if !child.is_empty() && !children.iter().any(|c| c == child) {
                children.push(child.to_owned());
            }
        }
        children
    }

    /// Counts the configured network interfaces.
    pub fn network_interfaces(&self) -> usize {
        NETWORK_PREFIXES
            .iter()
            .map(|prefix| self.network_interfaces_under(prefix))
            .sum()
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn network_interfaces_under(&self, prefix: &str) -> usize {
        self.keys(prefix)
            .iter()
            .filter(|child| child.parse::<usize>().is_ok())
            .count()
    }
}

/// Returns the leaf of an unindexed `lxc.network.<leaf>` key.
fn legacy_network_leaf(key: &str) -> Option<&str> {
    let leaf = key.strip_prefix(LEGACY_NETWORK_PREFIX)?.strip_prefix('.')?;
    let first = leaf.split('.').next()?;
    (first.parse::<usize>().is_err()).then_some(leaf)
}

/// Splits `lxc.network.<N>.<leaf>` into its index and leaf.
fn indexed_legacy_network(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix(LEGACY_NETWORK_PREFIX)?.strip_prefix('.')?;
    let (index, leaf) = rest.split_once('.')?;
    Some((index.parse().ok()?, leaf))
}

fn is_same_or_nested(key: &str, prefix: &str) -> bool {
    key == prefix
        || key
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Template used to create this container
lxc.utsname = rubik
lxc.rootfs = /var/lib/lxc/rubik/rootfs
lxc.cap.drop = sys_module
lxc.cap.drop = mac_admin

lxc.network.type = veth
lxc.network.link = lxcbr0
lxc.network.flags = up
lxc.network.mtu = 1500
";

    #[test]
    fn parse_collects_repeated_keys() {
        let store = ConfigStore::parse(SAMPLE).unwrap();
        assert_eq!(store.get("lxc.utsname"), vec!["rubik"]);
        assert_eq!(store.get("lxc.cap.drop"), vec!["sys_module", "mac_admin"]);
    }

    #[test]
    fn absent_key_reads_as_empty() {
        let store = ConfigStore::parse(SAMPLE).unwrap();
        assert!(store.get("lxc.mount.entry").is_empty());
    }

    #[test]
    fn legacy_network_block_is_indexed() {
        let store = ConfigStore::parse(SAMPLE).unwrap();
        assert_eq!(store.get("lxc.network.0.link"), vec!["lxcbr0"]);
        assert_eq!(store.keys("lxc.network.0"), vec!["type", "link", "flags", "mtu"]);
        assert_eq!(store.network_interfaces(), 1);
    }

    #[test]
    fn second_type_line_opens_new_interface() {
        let text = "\
lxc.network.type = veth
lxc.network.link = lxcbr0
lxc.network.type = empty
";
        let store = ConfigStore::parse(text).unwrap();
        assert_eq!(store.get("lxc.network.1.type"), vec!["empty"]);
        assert_eq!(store.keys("lxc.network"), vec!["0", "1"]);
        assert_eq!(store.network_interfaces(), 2);
    }

    #[test]
    fn modern_indexed_network_keys_are_counted() {
        let text = "lxc.net.0.type = veth\nlxc.net.1.type = veth\n";
        let store = ConfigStore::parse(text).unwrap();
        assert_eq!(store.network_interfaces(), 2);
    }

    #[test]
    fn append_keeps_previous_values() {
        let mut store = ConfigStore::new();
        store.append("lxc.cap.drop", "sys_module");
        store.append("lxc.cap.drop", "sys_time");
        assert_eq!(store.get("lxc.cap.drop"), vec!["sys_module", "sys_time"]);
    }

    #[test]
    fn clear_removes_all_values_and_nested_keys() {
        let mut store = ConfigStore::parse(SAMPLE).unwrap();
        assert!(store.clear("lxc.cap.drop"));
        assert!(store.get("lxc.cap.drop").is_empty());

        assert!(store.clear("lxc.network"));
        assert_eq!(store.network_interfaces(), 0);
        assert!(!store.clear("lxc.network"));
        assert_eq!(store.get("lxc.utsname"), vec!["rubik"]);
    }

    #[test]
    fn clear_does_not_touch_sibling_with_shared_prefix() {
        let mut store = ConfigStore::new();
        store.append("lxc.cap", "x");
        store.append("lxc.capabilities", "y");
        assert!(store.clear("lxc.cap"));
        assert_eq!(store.get("lxc.capabilities"), vec!["y"]);
    }

    #[test]
    fn keys_with_empty_prefix_lists_namespaces() {
        let mut store = ConfigStore::new();
        store.append("lxc.utsname", "a");
        store.append("user.note", "b");
        assert_eq!(store.keys(""), vec!["lxc", "user"]);
    }

    #[test]
    fn render_writes_network_type_first() {
        let mut store = ConfigStore::new();
        store.append("lxc.network.0.link", "lxcbr0");
        store.append("lxc.network.0.type", "veth");
        store.append("lxc.utsname", "rubik");
        assert_eq!(
            store.render(),
            "lxc.utsname = rubik\nlxc.network.type = veth\nlxc.network.link = lxcbr0\n"
        );
    }

    #[test]
    fn parse_rejects_line_without_separator() {
        let err = ConfigStore::parse("lxc.utsname rubik\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rubik").join("config");

        let store = ConfigStore::parse(SAMPLE).unwrap();
        store.save(&path).unwrap();
        let loaded = ConfigStore::load(&path).unwrap();

        assert_eq!(loaded.get("lxc.cap.drop"), vec!["sys_module", "mac_admin"]);
        assert_eq!(loaded.get("lxc.network.0.mtu"), vec!["1500"]);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn concurrent_saves_each_publish_a_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rubik").join("config");

        std::thread::scope(|scope| {
            for i in 0..8 {
                let path = &path;
                let _ = scope.spawn(move || {
                    let mut store = ConfigStore::parse(SAMPLE).unwrap();
                    store.replace("lxc.utsname", &format!("rubik-{i}"));
                    for _ in 0..20 {
                        store.save(path).unwrap();
                    }
                });
            }
        });

        let loaded = ConfigStore::load(&path).unwrap();
        assert!(loaded.get("lxc.utsname")[0].starts_with("rubik-"));
        assert_eq!(loaded.get("lxc.cap.drop"), vec!["sys_module", "mac_admin"]);
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ConfigStore::load(Path::new("/nonexistent/rubik/config")).unwrap_err();
        assert!(matches!(err, LxkitError::Io { .. }));
    }
}
