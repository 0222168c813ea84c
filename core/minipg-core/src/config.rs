//! Engine configuration.
//!
//! A resolved [`Config`] value is handed to the catalog at startup; components
//! derive every file path they touch from it. Directories are created lazily
//! by the writers themselves.

use crate::error::{MinipgError, MinipgResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage configuration, normally loaded from `minipg.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name of the database.
    pub database: String,
    /// Directory holding one schema JSON file per table.
    pub scheme_dir: PathBuf,
    /// Directory holding one binary row-log file per table.
    pub data_dir: PathBuf,
    /// Directory holding the btree/ and lsmt/ index subtrees.
    pub index_dir: PathBuf,
    /// Advisory run mode, "memory" or "disk".
    pub mode: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: "minipg".to_string(),
            scheme_dir: PathBuf::from(".minipg/scheme"),
            data_dir: PathBuf::from(".minipg/data"),
            index_dir: PathBuf::from(".minipg/index"),
            mode: "memory".to_string(),
        }
    }
}

impl Config {
    /// Load a configuration from a TOML file.
    ///
    /// A missing file yields the default in-memory configuration, so tests
    /// and first runs work without any setup.
    pub fn load(path: &Path) -> MinipgResult<Config> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&text).map_err(|e| MinipgError::Serialization(e.to_string()))
    }

    /// `<scheme_dir>/<table>.json`
    pub fn schema_path(&self, table: &str) -> PathBuf {
        self.scheme_dir.join(format!("{table}.json"))
    }

    /// `<data_dir>/<table>.avro`
    pub fn data_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{table}.avro"))
    }

    /// `<index_dir>/btree/<table>/<column>.index`
    pub fn btree_path(&self, table: &str, column: &str) -> PathBuf {
        self.index_dir
            .join("btree")
            .join(table)
            .join(format!("{column}.index"))
    }

    /// `<index_dir>/lsmt/<table>/<column>.memtable`
    pub fn memtable_path(&self, table: &str, column: &str) -> PathBuf {
        self.index_dir
            .join("lsmt")
            .join(table)
            .join(format!("{column}.memtable"))
    }

    /// `<index_dir>/lsmt/<table>/<column>.sstable`
    pub fn sstable_path(&self, table: &str, column: &str) -> PathBuf {
        self.index_dir
            .join("lsmt")
            .join(table)
            .join(format!("{column}.sstable"))
    }

    /// True for advisory in-memory runs (test shells, scratch sessions).
    pub fn is_memory(&self) -> bool {
        self.mode == "memory"
    }
}
