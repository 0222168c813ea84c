//! Table schemas and their persistence.
//!
//! A schema is the typed, ordered column list of one table. It is persisted
//! as JSON under `<scheme_dir>/<table>.json` when the table is created and
//! scanned back at startup to rebuild the catalog.

use crate::config::Config;
use crate::error::MinipgResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Declared column type. Encoded as 1 (Text), 2 (Int), or 3 (Unknown) in the
/// schema file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ColumnKind {
    Text,
    Int,
    Unknown,
}

impl From<ColumnKind> for u8 {
    fn from(kind: ColumnKind) -> u8 {
        match kind {
            ColumnKind::Text => 1,
            ColumnKind::Int => 2,
            ColumnKind::Unknown => 3,
        }
    }
}

impl TryFrom<u8> for ColumnKind {
    type Error = String;

    fn try_from(code: u8) -> Result<ColumnKind, String> {
        match code {
            1 => Ok(ColumnKind::Text),
            2 => Ok(ColumnKind::Int),
            3 => Ok(ColumnKind::Unknown),
            other => Err(format!("unknown column kind code {other}")),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Text => "text",
            ColumnKind::Int => "integer",
            ColumnKind::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// One named, typed column slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: &str, kind: ColumnKind) -> Column {
        Column {
            name: name.to_string(),
            kind,
        }
    }
}

/// A table's name, row count, and ordered columns.
///
/// `column_names` is derived from `columns` and kept alongside because most
/// lookups only need the names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub len: usize,
    pub columns: Vec<Column>,
    pub column_names: Vec<String>,
}

impl Schema {
    pub fn new(name: &str, columns: Vec<Column>) -> Schema {
        let column_names = columns.iter().map(|c| c.name.clone()).collect();
        Schema {
            name: name.to_string(),
            len: 0,
            columns,
            column_names,
        }
    }

    /// Positional index of a column name, if the schema has it.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Write the schema JSON to `<scheme_dir>/<table>.json`.
    pub fn save(&self, config: &Config) -> MinipgResult<()> {
        std::fs::create_dir_all(&config.scheme_dir)?;
        let bytes = serde_json::to_vec(self)?;
        std::fs::write(config.schema_path(&self.name), bytes)?;
        Ok(())
    }

    /// Read one schema JSON file.
    pub fn load(path: &Path) -> MinipgResult<Schema> {
        let bytes = std::fs::read(path)?;
        let schema = serde_json::from_slice(&bytes)?;
        Ok(schema)
    }

    /// Scan the scheme directory for `.json` files and decode each. A
    /// missing directory means no tables yet.
    pub fn load_all(config: &Config) -> MinipgResult<Vec<Schema>> {
        let entries = match std::fs::read_dir(&config.scheme_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut schemas = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                schemas.push(Schema::load(&path)?);
            }
        }
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(schemas)
    }
}
