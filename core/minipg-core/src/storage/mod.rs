//! Storage stack: schemas, the binary row codec, the table engine, and the
//! catalog tying table names to engines.

pub mod catalog;
pub mod codec;
pub mod schema;
pub mod table;

pub use catalog::Catalog;
pub use schema::{Column, ColumnKind, Schema};
pub use table::Table;

use serde::{Deserialize, Serialize};
use std::fmt;

/// One positional cell of a row.
///
/// Held as text regardless of the column's declared kind; the codec gives it
/// a typed binary form when a row hits the log. Comparison is byte
/// lexicographic, which WHERE evaluation relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Field(String);

impl Field {
    pub fn new(text: &str) -> Field {
        Field(text.to_string())
    }

    /// Build a field from raw statement text, stripping one pair of
    /// surrounding single or double quotes.
    pub fn purified(raw: &str) -> Field {
        Field(strip_quotes(raw).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Positional sequence of fields, one per schema column.
pub type Row = Vec<Field>;

fn strip_quotes(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'\'' || first == b'"') {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}
