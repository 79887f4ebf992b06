//! Hwmon chip resolution and sensor path normalization.
//!
//! Hwmon directory indices under /sys/class/hwmon are not stable across
//! reboots, so configured sensor paths reference chips by name through a
//! `{chipname}` placeholder instead of a hwmonN index. This module scans the
//! mounted host /sys once, builds a chip-name to directory map from each
//! entry's `name` file, and rewrites configured paths into paths that are
//! readable inside the container.

use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the host /sys tree is mounted inside the container.
pub const DEFAULT_SYS_MOUNT: &str = "/hostsys";

/// Resolves chip names to hwmon directories and normalizes sensor paths.
///
/// The chip map is built once at construction and is immutable afterwards.
/// If the host re-enumerates hardware while the process is alive, the map
/// goes stale until the next invocation; collection runs are short-lived
/// cron invocations, so this never matters in practice.
pub struct ChipResolver {
    sys_mount: PathBuf,
    chips: HashMap<String, PathBuf>,
    placeholder: Regex,
}

impl ChipResolver {
    /// Builds a resolver by scanning `<sys_mount>/class/hwmon`.
    ///
    /// A missing or unreadable hwmon root yields an empty map, not an
    /// error; every later `resolve` simply finds nothing.
    pub fn new(sys_mount: impl Into<PathBuf>) -> Self {
        let sys_mount = sys_mount.into();
        let chips = scan_hwmon(&sys_mount.join("class").join("hwmon"));
        debug!("chip map: {} hwmon entries", chips.len());
        Self {
            sys_mount,
            chips,
            placeholder: Regex::new(r"\{([^}]+)\}").expect("placeholder pattern is valid"),
        }
    }

    /// Resolves a chip name to its hwmon directory.
    ///
    /// Match order: exact, case-insensitive exact, case-insensitive prefix.
    /// Ties within a stage are broken by lexical order of the chip name, so
    /// resolution is deterministic for any given map.
    pub fn resolve(&self, token: &str) -> Option<&Path> {
        if let Some(dir) = self.chips.get(token) {
            return Some(dir);
        }

        let mut names: Vec<&String> = self.chips.keys().collect();
        names.sort();

        let lowered = token.to_lowercase();
        for name in &names {
            if name.to_lowercase() == lowered {
                return self.chips.get(name.as_str()).map(PathBuf::as_path);
            }
        }
        for name in &names {
            if name.to_lowercase().starts_with(&lowered) {
                return self.chips.get(name.as_str()).map(PathBuf::as_path);
            }
        }
        None
    }

    /// Rewrites a configured sensor path into a container-readable path.
    ///
    /// Accepts any of:
    /// - `/sys/class/hwmon/hwmonX/FILE` (host absolute)
    /// - `<sys_mount>/{chip}/FILE` (placeholder)
    /// - `/host/{chip}/FILE` or `/host/hwmonX/FILE` (legacy, normalized)
    ///
    /// Every step is best-effort: an unresolvable chip or a broken symlink
    /// leaves the path as-is, and the caller treats a non-existent result
    /// as the error signal.
    pub fn to_container_path(&self, raw: &str) -> PathBuf {
        self.rewrite(raw, true)
    }

    fn rewrite(&self, raw: &str, allow_reprocess: bool) -> PathBuf {
        let mount = self.sys_mount.to_string_lossy();
        let mut s = raw.to_string();

        // 1) Host-absolute /sys/... into the mounted namespace.
        if let Some(rest) = s.strip_prefix("/sys/") {
            s = format!("{}/{}", mount, rest);
        }

        // 2) Legacy /host/hwmonX -> <mount>/class/hwmonX layout.
        if s.starts_with("/host/hwmon") {
            let rest = &s["/host/".len()..];
            s = format!("{}/class/{}", mount, rest);
        }

        // 3) {chip} placeholder, substituted with the resolved directory.
        let token = self
            .placeholder
            .captures(&s)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        if let Some(token) = token {
            if let Some(base) = self.resolve(&token) {
                let tail = s
                    .split_once('}')
                    .map(|(_, t)| t.trim_start_matches('/').to_string())
                    .unwrap_or_default();
                s = base.join(&tail).to_string_lossy().into_owned();
            }
        }

        // 4) Legacy /host/{chip}/FILE: normalize the prefix, then run the
        //    pipeline once more. Bounded, never recurses a second time.
        if allow_reprocess && s.starts_with("/host/{") {
            let rest = &s["/host/".len()..];
            let normalized = format!("{}/{}", mount, rest);
            return self.rewrite(&normalized, false);
        }

        // 5) Resolve symlinks. hwmon entries are symlinks into the host
        //    device tree; if canonicalization escapes back to the bare
        //    /sys namespace, re-anchor under the mount.
        match fs::canonicalize(&s) {
            Ok(resolved) => {
                let resolved_str = resolved.to_string_lossy();
                if let Some(rest) = resolved_str.strip_prefix("/sys/") {
                    PathBuf::from(format!("{}/{}", mount, rest))
                } else {
                    resolved
                }
            }
            Err(_) => PathBuf::from(s),
        }
    }

    /// Number of chips discovered at build time.
    pub fn chip_count(&self) -> usize {
        self.chips.len()
    }
}

/// Scans a hwmon root, mapping each entry's declared chip name to its
/// directory. Entries are visited in sorted directory-name order; when two
/// entries declare the same chip name, the last one visited wins.
fn scan_hwmon(hwmon_root: &Path) -> HashMap<String, PathBuf> {
    let mut chips = HashMap::new();

    let entries = match fs::read_dir(hwmon_root) {
        Ok(entries) => entries,
        Err(_) => return chips, // hwmon root absent or unreadable
    };

    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with("hwmon"))
                .unwrap_or(false)
        })
        .collect();
    dirs.sort();

    for dir in dirs {
        let name_file = dir.join("name");
        match fs::read_to_string(&name_file) {
            Ok(content) => {
                let chip = content.trim().to_string();
                if !chip.is_empty() {
                    chips.insert(chip, dir);
                }
            }
            Err(_) => continue,
        }
    }

    chips
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_hwmon_root_yields_empty_map() {
        let resolver = ChipResolver::new("/nonexistent-mount-point");
        assert_eq!(resolver.chip_count(), 0);
        assert!(resolver.resolve("k10temp").is_none());
    }

    #[test]
    fn unresolved_placeholder_path_is_left_unchanged() {
        let resolver = ChipResolver::new("/nonexistent-mount-point");
        let p = resolver.to_container_path("/nonexistent-mount-point/{k10temp}/temp1_input");
        assert_eq!(
            p,
            PathBuf::from("/nonexistent-mount-point/{k10temp}/temp1_input")
        );
    }

    #[test]
    fn sys_prefix_is_reanchored_into_the_mount() {
        let resolver = ChipResolver::new("/nonexistent-mount-point");
        let p = resolver.to_container_path("/sys/class/hwmon/hwmon0/temp1_input");
        assert_eq!(
            p,
            PathBuf::from("/nonexistent-mount-point/class/hwmon/hwmon0/temp1_input")
        );
    }

    #[test]
    fn legacy_host_hwmon_prefix_is_normalized() {
        let resolver = ChipResolver::new("/nonexistent-mount-point");
        let p = resolver.to_container_path("/host/hwmon3/temp1_input");
        assert_eq!(
            p,
            PathBuf::from("/nonexistent-mount-point/class/hwmon3/temp1_input")
        );
    }
}
