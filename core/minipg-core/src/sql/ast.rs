//! Parsed statement types, the interface between the parser and the engine.

use crate::storage::schema::Column;

/// Comparison operator of a WHERE clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CmpKind {
    #[default]
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// The single-predicate filter of SELECT and UPDATE.
///
/// An empty clause (no column, no value) selects every row. A clause with
/// only one side set is malformed and never leaves the parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    pub column: String,
    pub cmp: CmpKind,
    pub value: String,
}

impl WhereClause {
    pub fn new(column: &str, cmp: CmpKind, value: &str) -> WhereClause {
        WhereClause {
            column: column.to_string(),
            cmp,
            value: value.to_string(),
        }
    }

    /// Both sides blank: no filtering.
    pub fn is_empty(&self) -> bool {
        self.column.is_empty() && self.value.is_empty()
    }

    /// Exactly one side blank: malformed.
    pub fn either_empty(&self) -> bool {
        self.column.is_empty() != self.value.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub name: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table_name: String,
    /// Explicit column list; empty when `contains_all_columns` is set.
    pub column_names: Vec<String>,
    /// Value rows, still in raw statement text.
    pub rows: Vec<Vec<String>>,
    pub contains_all_columns: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub table_name: String,
    pub column_names: Vec<String>,
    pub contains_all_columns: bool,
    pub where_clause: WhereClause,
}

/// One `SET column = value` pair of an UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnUpdate {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub table_name: String,
    pub values: Vec<ColumnUpdate>,
    pub where_clause: WhereClause,
}

/// Tagged union of everything the executor dispatches.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTableStmt),
    Insert(InsertStmt),
    Select(SelectStmt),
    Update(UpdateStmt),
}
