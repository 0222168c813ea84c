//! Statement dispatch over the catalog.

use crate::error::MinipgResult;
use crate::sql::ast::Statement;
use crate::storage::Row;
use crate::storage::catalog::Catalog;

/// What a successfully executed statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    /// CREATE TABLE registered the named table.
    Created(String),
    /// Number of rows inserted.
    Inserted(usize),
    /// SELECT result, already filtered and projected.
    Rows(Vec<Row>),
    /// Number of rows updated.
    Updated(usize),
}

/// Route one parsed statement to its table engine.
pub fn execute(catalog: &mut Catalog, stmt: &Statement) -> MinipgResult<ExecOutcome> {
    match stmt {
        Statement::CreateTable(create) => {
            catalog.create_table(create)?;
            Ok(ExecOutcome::Created(create.name.clone()))
        }
        Statement::Insert(insert) => {
            let count = catalog.get_mut(&insert.table_name)?.insert(insert)?;
            Ok(ExecOutcome::Inserted(count))
        }
        Statement::Select(select) => {
            let rows = catalog.get(&select.table_name)?.select(select)?;
            Ok(ExecOutcome::Rows(rows))
        }
        Statement::Update(update) => {
            let count = catalog.get_mut(&update.table_name)?.update(update)?;
            Ok(ExecOutcome::Updated(count))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::MinipgError;
    use crate::sql::ast::{
        CmpKind, CreateTableStmt, InsertStmt, SelectStmt, WhereClause,
    };
    use crate::storage::schema::{Column, ColumnKind};

    fn temp_catalog(dir: &tempfile::TempDir) -> Catalog {
        Catalog::open(Config {
            database: "test".to_string(),
            scheme_dir: dir.path().join("scheme"),
            data_dir: dir.path().join("data"),
            index_dir: dir.path().join("index"),
            mode: "memory".to_string(),
        })
        .unwrap()
    }

    fn create_users() -> Statement {
        Statement::CreateTable(CreateTableStmt {
            name: "users".to_string(),
            columns: vec![
                Column::new("name", ColumnKind::Text),
                Column::new("age", ColumnKind::Int),
            ],
        })
    }

    #[test]
    fn dispatches_all_statement_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = temp_catalog(&dir);

        let created = execute(&mut catalog, &create_users()).unwrap();
        assert_eq!(created, ExecOutcome::Created("users".to_string()));

        let inserted = execute(
            &mut catalog,
            &Statement::Insert(InsertStmt {
                table_name: "users".to_string(),
                column_names: Vec::new(),
                rows: vec![
                    vec!["'a'".to_string(), "11".to_string()],
                    vec!["'b'".to_string(), "12".to_string()],
                ],
                contains_all_columns: true,
            }),
        )
        .unwrap();
        assert_eq!(inserted, ExecOutcome::Inserted(2));

        let selected = execute(
            &mut catalog,
            &Statement::Select(SelectStmt {
                table_name: "users".to_string(),
                column_names: Vec::new(),
                contains_all_columns: true,
                where_clause: WhereClause::new("name", CmpKind::Eq, "a"),
            }),
        )
        .unwrap();
        match selected {
            ExecOutcome::Rows(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0][0].as_str(), "a");
            }
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn unknown_table_surfaces_from_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = temp_catalog(&dir);
        let err = execute(
            &mut catalog,
            &Statement::Select(SelectStmt {
                table_name: "ghosts".to_string(),
                column_names: Vec::new(),
                contains_all_columns: true,
                where_clause: WhereClause::default(),
            }),
        )
        .unwrap_err();
        assert!(matches!(err, MinipgError::TableNotExisted(_)));
    }
}
