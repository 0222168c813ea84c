//! The table engine.
//!
//! A table owns its schema, the in-memory row list, the append-only row log
//! on disk, and one index pair per column. Rows are append-only within a
//! process run; UPDATE overwrites fields in memory and leaves the on-disk
//! image at its insert-time state until the next reload.
//!
//! Ordering inside one insert: the encoded rows are appended to the row log
//! first (capturing offset and length), the indexes are fed next, and the
//! in-memory row list is extended last, so a failed log write changes
//! nothing observable.

use crate::config::Config;
use crate::error::{MinipgError, MinipgResult};
use crate::index::{IndexData, IndexSet};
use crate::sql::ast::{CmpKind, InsertStmt, SelectStmt, UpdateStmt, WhereClause};
use crate::storage::codec::{self, ROW_SEPARATOR};
use crate::storage::schema::Schema;
use crate::storage::{Field, Row};
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

#[derive(Debug)]
pub struct Table {
    pub schema: Schema,
    pub rows: Vec<Row>,
    data_path: PathBuf,
    index: IndexSet,
}

impl Table {
    /// Fresh table: empty rows, empty indexes, schema persisted immediately.
    pub fn create(schema: Schema, config: &Config) -> MinipgResult<Table> {
        let index = IndexSet::create(&schema.name, &schema.column_names, config);
        schema.save(config)?;
        Ok(Table {
            data_path: config.data_path(&schema.name),
            schema,
            rows: Vec::new(),
            index,
        })
    }

    /// Rebuild a table from disk: rows from the row log, indexes from their
    /// files. Missing files mean an empty table with empty indexes.
    pub fn load_from_disk(mut schema: Schema, config: &Config) -> MinipgResult<Table> {
        let index = IndexSet::load(&schema.name, &schema.column_names, config);
        let data_path = config.data_path(&schema.name);
        let rows = match std::fs::read(&data_path) {
            Ok(bytes) => codec::decode_rows(&schema, &bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        schema.len = rows.len();
        Ok(Table {
            schema,
            rows,
            data_path,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Validate, encode, and append the statement's rows; fan every column
    /// value into both of the column's indexes. Returns the inserted count.
    pub fn insert(&mut self, stmt: &InsertStmt) -> MinipgResult<usize> {
        if stmt.rows.is_empty() {
            return Err(MinipgError::ValuesIncomplete);
        }
        if !stmt.column_names.is_empty() {
            // explicit column lists must repeat the schema order exactly
            if stmt.column_names.len() != self.schema.columns.len() {
                return Err(MinipgError::ColumnNamesNotMatched);
            }
            for (column, given) in self.schema.columns.iter().zip(&stmt.column_names) {
                if column.name != *given {
                    return Err(MinipgError::ColumnNamesNotMatched);
                }
            }
        }
        let expected = if stmt.contains_all_columns {
            self.schema.columns.len()
        } else {
            stmt.column_names.len()
        };

        let mut rows = Vec::with_capacity(stmt.rows.len());
        for raw in &stmt.rows {
            let row: Row = raw.iter().map(|v| Field::purified(v)).collect();
            if row.len() != expected {
                return Err(MinipgError::ValuesIncomplete);
            }
            rows.push(row);
        }

        let located = self.append_to_log(&rows)?;
        for (row, (offset, length)) in rows.iter().zip(&located) {
            for (column, field) in self.schema.column_names.iter().zip(row) {
                self.index
                    .insert(column, field.as_str(), *offset, *length, 0, 0)?;
            }
        }

        let count = rows.len();
        self.rows.extend(rows);
        self.schema.len = self.rows.len();
        Ok(count)
    }

    /// Filter by WHERE, then project. `contains_all_columns` returns the
    /// candidate rows as-is; otherwise columns come back in requested order.
    pub fn select(&self, stmt: &SelectStmt) -> MinipgResult<Vec<Row>> {
        for name in &stmt.column_names {
            if !self.schema.contains_column(name) {
                return Err(MinipgError::ColumnNamesNotMatched);
            }
        }
        self.check_where_column(&stmt.where_clause)?;

        let filtered = self.filter(&stmt.where_clause);
        if stmt.contains_all_columns {
            return Ok(filtered);
        }
        let positions: Vec<usize> = stmt
            .column_names
            .iter()
            .filter_map(|name| self.schema.column_index(name))
            .collect();
        Ok(filtered
            .iter()
            .map(|row| positions.iter().map(|&p| row[p].clone()).collect())
            .collect())
    }

    /// Overwrite the named columns of every row matching WHERE. In-memory
    /// only; the row log keeps the insert-time image.
    pub fn update(&mut self, stmt: &UpdateStmt) -> MinipgResult<usize> {
        for value in &stmt.values {
            if !self.schema.contains_column(&value.name) {
                return Err(MinipgError::ColumnNamesNotMatched);
            }
        }
        self.check_where_column(&stmt.where_clause)?;

        let targets = self.filter_indices(&stmt.where_clause);
        for &row_index in &targets {
            for value in &stmt.values {
                if let Some(position) = self.schema.column_index(&value.name) {
                    self.rows[row_index][position] = Field::purified(&value.value);
                }
            }
        }
        Ok(targets.len())
    }

    /// Index-backed point lookup: resolve the column value through the index
    /// pair, then seek into the row log and decode the stored row.
    pub fn search(&mut self, column: &str, value: &str) -> MinipgResult<Row> {
        let data = self
            .index
            .search(column, value)?
            .ok_or(MinipgError::RowNotExisted)?;
        self.read_row(data)
    }

    fn check_where_column(&self, where_clause: &WhereClause) -> MinipgResult<()> {
        if !where_clause.is_empty() && !self.schema.contains_column(&where_clause.column) {
            return Err(MinipgError::ColumnNamesNotMatched);
        }
        Ok(())
    }

    fn filter(&self, where_clause: &WhereClause) -> Vec<Row> {
        self.filter_indices(where_clause)
            .into_iter()
            .map(|i| self.rows[i].clone())
            .collect()
    }

    /// Indices of the rows satisfying WHERE; every row for the empty clause.
    fn filter_indices(&self, where_clause: &WhereClause) -> Vec<usize> {
        if where_clause.is_empty() {
            return (0..self.rows.len()).collect();
        }
        let Some(position) = self.schema.column_index(&where_clause.column) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matched(row, where_clause, position))
            .map(|(i, _)| i)
            .collect()
    }

    /// Append encoded rows to the row log, one 0x0A separator after each
    /// record, and report each record's (offset, length).
    fn append_to_log(&self, rows: &[Row]) -> MinipgResult<Vec<(u16, u16)>> {
        if let Some(parent) = self.data_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.data_path)?;
        let mut offset = file.metadata()?.len();

        let mut located = Vec::with_capacity(rows.len());
        let mut buf = Vec::new();
        for row in rows {
            let record = codec::encode_row(&self.schema, row)?;
            located.push((offset as u16, record.len() as u16));
            offset += record.len() as u64 + 1;
            buf.extend_from_slice(&record);
            buf.push(ROW_SEPARATOR);
        }
        file.write_all(&buf)?;
        Ok(located)
    }

    fn read_row(&self, data: IndexData) -> MinipgResult<Row> {
        let mut file = OpenOptions::new().read(true).open(&self.data_path)?;
        file.seek(SeekFrom::Start(u64::from(data.offset)))?;
        let mut buf = vec![0u8; data.length as usize];
        file.read_exact(&mut buf)?;
        codec::decode_row(&self.schema, &buf)
    }
}

/// One row against one comparator, byte-lexicographic for every column kind.
fn matched(row: &Row, where_clause: &WhereClause, position: usize) -> bool {
    let field = &row[position];
    let value = Field::purified(&where_clause.value);
    match where_clause.cmp {
        CmpKind::Eq => *field == value,
        CmpKind::NotEq => *field != value,
        CmpKind::Gt => *field > value,
        CmpKind::Gte => *field >= value,
        CmpKind::Lt => *field < value,
        CmpKind::Lte => *field <= value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::{Column, ColumnKind};

    fn temp_config(dir: &tempfile::TempDir) -> Config {
        Config {
            database: "test".to_string(),
            scheme_dir: dir.path().join("scheme"),
            data_dir: dir.path().join("data"),
            index_dir: dir.path().join("index"),
            mode: "memory".to_string(),
        }
    }

    fn users_schema() -> Schema {
        Schema::new(
            "users",
            vec![
                Column::new("name", ColumnKind::Text),
                Column::new("age", ColumnKind::Int),
            ],
        )
    }

    fn insert_stmt(rows: &[[&str; 2]]) -> InsertStmt {
        InsertStmt {
            table_name: "users".to_string(),
            column_names: Vec::new(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect(),
            contains_all_columns: true,
        }
    }

    fn select_all(where_clause: WhereClause) -> SelectStmt {
        SelectStmt {
            table_name: "users".to_string(),
            column_names: Vec::new(),
            contains_all_columns: true,
            where_clause,
        }
    }

    fn row(name: &str, age: &str) -> Row {
        vec![Field::new(name), Field::new(age)]
    }

    #[test]
    fn create_persists_schema() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let table = Table::create(users_schema(), &config).unwrap();

        assert!(config.schema_path("users").exists());
        assert!(table.rows.is_empty());
        assert_eq!(table.name(), "users");
    }

    #[test]
    fn insert_appends_and_strips_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::create(users_schema(), &temp_config(&dir)).unwrap();

        let count = table
            .insert(&insert_stmt(&[["'a'", "11"], ["'b'", "12"]]))
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(table.rows, vec![row("a", "11"), row("b", "12")]);
        assert_eq!(table.schema.len, 2);
    }

    #[test]
    fn insert_rejects_empty_statement() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::create(users_schema(), &temp_config(&dir)).unwrap();
        let err = table.insert(&insert_stmt(&[])).unwrap_err();
        assert!(matches!(err, MinipgError::ValuesIncomplete));
    }

    #[test]
    fn insert_rejects_arity_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::create(users_schema(), &temp_config(&dir)).unwrap();
        let mut stmt = insert_stmt(&[["a", "11"]]);
        stmt.rows[0].push("extra".to_string());
        let err = table.insert(&stmt).unwrap_err();
        assert!(matches!(err, MinipgError::ValuesIncomplete));
    }

    #[test]
    fn insert_rejects_reordered_column_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::create(users_schema(), &temp_config(&dir)).unwrap();
        let mut stmt = insert_stmt(&[["11", "a"]]);
        stmt.contains_all_columns = false;
        stmt.column_names = vec!["age".to_string(), "name".to_string()];
        let err = table.insert(&stmt).unwrap_err();
        assert!(matches!(err, MinipgError::ColumnNamesNotMatched));
    }

    #[test]
    fn insert_accepts_matching_column_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::create(users_schema(), &temp_config(&dir)).unwrap();
        let mut stmt = insert_stmt(&[["a", "11"]]);
        stmt.contains_all_columns = false;
        stmt.column_names = vec!["name".to_string(), "age".to_string()];
        assert_eq!(table.insert(&stmt).unwrap(), 1);
    }

    #[test]
    fn failed_log_write_leaves_rows_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let mut table = Table::create(users_schema(), &config).unwrap();
        // occupy the row log path with a directory so the append must fail
        std::fs::create_dir_all(config.data_path("users")).unwrap();

        let err = table.insert(&insert_stmt(&[["a", "11"]]));
        assert!(err.is_err());
        assert!(table.rows.is_empty());
        assert_eq!(table.schema.len, 0);
    }

    #[test]
    fn select_all_and_point_where() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::create(users_schema(), &temp_config(&dir)).unwrap();
        table
            .insert(&insert_stmt(&[["'a'", "11"], ["'b'", "12"]]))
            .unwrap();

        let all = table.select(&select_all(WhereClause::default())).unwrap();
        assert_eq!(all.len(), 2);

        let one = table
            .select(&select_all(WhereClause::new("name", CmpKind::Eq, "a")))
            .unwrap();
        assert_eq!(one, vec![row("a", "11")]);
    }

    #[test]
    fn select_projection_keeps_requested_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::create(users_schema(), &temp_config(&dir)).unwrap();
        table
            .insert(&insert_stmt(&[["'a'", "11"], ["'b'", "12"]]))
            .unwrap();

        let stmt = SelectStmt {
            table_name: "users".to_string(),
            column_names: vec!["age".to_string(), "name".to_string()],
            contains_all_columns: false,
            where_clause: WhereClause::new("name", CmpKind::NotEq, "a"),
        };
        let rows = table.select(&stmt).unwrap();
        assert_eq!(rows, vec![row("12", "b")]);
    }

    #[test]
    fn select_rejects_unknown_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::create(users_schema(), &temp_config(&dir)).unwrap();
        table.insert(&insert_stmt(&[["a", "11"]])).unwrap();

        let mut stmt = select_all(WhereClause::default());
        stmt.contains_all_columns = false;
        stmt.column_names = vec!["email".to_string()];
        assert!(matches!(
            table.select(&stmt).unwrap_err(),
            MinipgError::ColumnNamesNotMatched
        ));

        let stmt = select_all(WhereClause::new("email", CmpKind::Eq, "x"));
        assert!(matches!(
            table.select(&stmt).unwrap_err(),
            MinipgError::ColumnNamesNotMatched
        ));
    }

    #[test]
    fn where_comparators_use_byte_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::create(users_schema(), &temp_config(&dir)).unwrap();
        table
            .insert(&insert_stmt(&[["a", "10"], ["b", "2"], ["c", "30"]]))
            .unwrap();

        let ages = |cmp, value: &str| -> Vec<String> {
            table
                .select(&select_all(WhereClause::new("age", cmp, value)))
                .unwrap()
                .into_iter()
                .map(|r| r[1].to_string())
                .collect()
        };

        assert_eq!(ages(CmpKind::Eq, "2"), vec!["2"]);
        assert_eq!(ages(CmpKind::NotEq, "2"), vec!["10", "30"]);
        // "2" > "10" and "2" < "30" under byte-lexicographic comparison
        assert_eq!(ages(CmpKind::Gt, "10"), vec!["2", "30"]);
        assert_eq!(ages(CmpKind::Gte, "2"), vec!["2", "30"]);
        assert_eq!(ages(CmpKind::Lt, "30"), vec!["10", "2"]);
        assert_eq!(ages(CmpKind::Lte, "10"), vec!["10"]);
    }

    #[test]
    fn update_overwrites_matching_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::create(users_schema(), &temp_config(&dir)).unwrap();
        table
            .insert(&insert_stmt(&[["'x'", "1"], ["'y'", "2"]]))
            .unwrap();

        let stmt = UpdateStmt {
            table_name: "users".to_string(),
            values: vec![crate::sql::ast::ColumnUpdate {
                name: "age".to_string(),
                value: "9".to_string(),
            }],
            where_clause: WhereClause::new("name", CmpKind::Eq, "x"),
        };
        assert_eq!(table.update(&stmt).unwrap(), 1);

        let x = table
            .select(&select_all(WhereClause::new("name", CmpKind::Eq, "x")))
            .unwrap();
        assert_eq!(x, vec![row("x", "9")]);
        let y = table
            .select(&select_all(WhereClause::new("name", CmpKind::Eq, "y")))
            .unwrap();
        assert_eq!(y, vec![row("y", "2")]);
    }

    #[test]
    fn update_with_empty_where_touches_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::create(users_schema(), &temp_config(&dir)).unwrap();
        table
            .insert(&insert_stmt(&[["a", "1"], ["b", "2"]]))
            .unwrap();

        let stmt = UpdateStmt {
            table_name: "users".to_string(),
            values: vec![crate::sql::ast::ColumnUpdate {
                name: "age".to_string(),
                value: "0".to_string(),
            }],
            where_clause: WhereClause::default(),
        };
        assert_eq!(table.update(&stmt).unwrap(), 2);
        assert_eq!(table.rows, vec![row("a", "0"), row("b", "0")]);
    }

    #[test]
    fn search_reads_row_back_through_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::create(users_schema(), &temp_config(&dir)).unwrap();
        table
            .insert(&insert_stmt(&[["'a'", "11"], ["'b'", "12"]]))
            .unwrap();

        assert_eq!(table.search("name", "a").unwrap(), row("a", "11"));
        assert_eq!(table.search("name", "b").unwrap(), row("b", "12"));
        assert_eq!(table.search("age", "12").unwrap(), row("b", "12"));
        assert!(matches!(
            table.search("name", "zzz").unwrap_err(),
            MinipgError::RowNotExisted
        ));
    }

    #[test]
    fn load_from_disk_restores_rows_and_indexes() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        {
            let mut table = Table::create(users_schema(), &config).unwrap();
            table
                .insert(&insert_stmt(&[["'a'", "11"], ["'b'", "12"]]))
                .unwrap();
        }

        let schema = Schema::load(&config.schema_path("users")).unwrap();
        let mut reopened = Table::load_from_disk(schema, &config).unwrap();
        assert_eq!(reopened.rows, vec![row("a", "11"), row("b", "12")]);
        assert_eq!(reopened.schema.len, 2);
        assert_eq!(reopened.search("name", "b").unwrap(), row("b", "12"));
    }

    #[test]
    fn load_from_disk_without_row_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        users_schema().save(&config).unwrap();

        let schema = Schema::load(&config.schema_path("users")).unwrap();
        let table = Table::load_from_disk(schema, &config).unwrap();
        assert!(table.rows.is_empty());
    }
}
