//! Persisted connection records (connections.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hmdfleet_core::prelude::*;
use hmdfleet_core::types::ConnectionRecord;

const CONNECTIONS_FILENAME: &str = "connections.toml";

/// On-disk shape: a list of `[[connections]]` tables
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordsFile {
    #[serde(default)]
    connections: Vec<ConnectionRecord>,
}

/// Persistence for the set of devices to reconnect to at startup
///
/// Records outlive their sessions: removing a session does not touch the
/// store, and records are only ever deleted by an explicit forget.
#[derive(Debug, Clone)]
pub struct ConnectionStore {
    path: PathBuf,
}

impl ConnectionStore {
    /// Store backed by an explicit file path (tests use a temp dir)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under the user config dir
    pub fn default_location() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("hmdfleet").join(CONNECTIONS_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records
    ///
    /// Returns an empty set if the file doesn't exist or can't be parsed.
    pub fn load_all(&self) -> Vec<ConnectionRecord> {
        if !self.path.exists() {
            debug!("No connections file at {:?}", self.path);
            return Vec::new();
        }

        match std::fs::read_to_string(&self.path) {
            Ok(content) => match toml::from_str::<RecordsFile>(&content) {
                Ok(file) => file.connections,
                Err(e) => {
                    warn!("Failed to parse {:?}: {}", self.path, e);
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("Failed to read {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    /// Insert or replace the record for `record.address`
    pub fn upsert(&self, record: ConnectionRecord) -> Result<()> {
        let mut connections = self.load_all();

        match connections.iter_mut().find(|r| r.address == record.address) {
            Some(existing) => *existing = record,
            None => connections.push(record),
        }

        self.save_all(&connections)
    }

    /// Delete every record; the file is rewritten empty
    pub fn delete_all(&self) -> Result<()> {
        self.save_all(&[])
    }

    /// Write the full record set atomically (temp file + rename)
    pub fn save_all(&self, connections: &[ConnectionRecord]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::store("connections path has no parent directory"))?;

        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::store(format!("Failed to create config dir: {}", e)))?;
        }

        let file = RecordsFile {
            connections: connections.to_vec(),
        };
        let content = toml::to_string_pretty(&file)
            .map_err(|e| Error::store(format!("Failed to serialize connections: {}", e)))?;

        let header = "# Saved device connections for hmdfleet.\n\
                      # An empty password means the default credentials are used at connect time.\n";
        let full_content = format!("{}{}", header, content);

        let temp_path = dir.join(".connections.toml.tmp");
        std::fs::write(&temp_path, &full_content)
            .map_err(|e| Error::store(format!("Failed to write temp file: {}", e)))?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| Error::store(format!("Failed to rename temp file: {}", e)))?;

        info!("Saved {} connection records to {:?}", connections.len(), self.path);
        Ok(())
    }
}
