//! Unraid disks.ini parsing and serial-keyed disk lookup.
//!
//! Unraid's emhttp daemon periodically rewrites /var/local/emhttp/disks.ini
//! with the current state of every attached disk. This module parses that
//! INI-style snapshot and looks records up by the stable `idSb` serial
//! field. No SMART calls are made here; the host already did that work.
//!
//! The file is re-read on every lookup. emhttp may rewrite it at any time,
//! so freshness is worth the extra I/O.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the host snapshot, mounted into the container.
pub const DEFAULT_DISKS_INI: &str = "/var/local/emhttp/disks.ini";

/// Field carrying the stable serial identifier of a disk.
const SERIAL_KEY: &str = "idSb";

#[derive(Debug, Error)]
pub enum DiskLookupError {
    #[error("cannot read {path}: {source} (is /var/local/emhttp mounted?)")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("disk with serial '{0}' not found in snapshot")]
    NotFound(String),
}

/// One disk's snapshot entry: the section name plus its full field map.
#[derive(Debug, Clone)]
pub struct DiskRecord {
    pub section: String,
    pub fields: HashMap<String, String>,
}

/// Serial-keyed access to the disks.ini snapshot.
pub struct DiskRecordStore {
    path: PathBuf,
}

impl DiskRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Finds the disk whose `idSb` field equals `serial`.
    ///
    /// Re-reads and re-parses the snapshot file on every call.
    pub fn lookup(&self, serial: &str) -> Result<DiskRecord, DiskLookupError> {
        let text = fs::read_to_string(&self.path).map_err(|source| DiskLookupError::Io {
            path: self.path.clone(),
            source,
        })?;

        for (section, fields) in parse(&text) {
            if fields.get(SERIAL_KEY).map(String::as_str) == Some(serial) {
                return Ok(DiskRecord { section, fields });
            }
        }

        Err(DiskLookupError::NotFound(serial.to_string()))
    }
}

/// Line-oriented INI parse.
///
/// `[Section]` opens a section; `key=value` adds a field to the current
/// section (one pair of surrounding double quotes is stripped from the
/// value); blank lines and `#`/`;` comments are ignored; anything else is
/// silently skipped. Sections do not nest. Order is preserved.
pub fn parse(text: &str) -> Vec<(String, HashMap<String, String>)> {
    let mut sections: Vec<(String, HashMap<String, String>)> = Vec::new();
    let mut current: Option<usize> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = section_header(line) {
            current = Some(match sections.iter().position(|(s, _)| s == name) {
                Some(pos) => pos, // reopened section extends the earlier one
                None => {
                    sections.push((name.to_string(), HashMap::new()));
                    sections.len() - 1
                }
            });
            continue;
        }

        if let (Some(idx), Some((key, value))) = (current, line.split_once('=')) {
            let key = key.trim().to_string();
            let value = unquote(value.trim()).to_string();
            sections[idx].1.insert(key, value);
        }
        // No '=' and not a header: malformed line, skipped.
    }

    sections
}

fn section_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('[')?;
    let end = rest.find(']')?;
    let name = rest[..end].trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
