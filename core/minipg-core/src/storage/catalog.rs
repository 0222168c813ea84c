//! The catalog: every known table, keyed by name.
//!
//! An explicit value threaded through the executor rather than process-wide
//! state. Opened once at startup by scanning the scheme directory and
//! reloading each table from its files; mutated afterwards only by
//! CREATE TABLE.

use crate::config::Config;
use crate::error::{MinipgError, MinipgResult};
use crate::sql::ast::CreateTableStmt;
use crate::storage::schema::Schema;
use crate::storage::table::Table;
use std::collections::HashMap;
use tracing::info;

pub struct Catalog {
    config: Config,
    tables: HashMap<String, Table>,
}

impl Catalog {
    /// Scan `<scheme_dir>` for schema files and rebuild every table.
    pub fn open(config: Config) -> MinipgResult<Catalog> {
        let mut tables = HashMap::new();
        for schema in Schema::load_all(&config)? {
            let name = schema.name.clone();
            let table = Table::load_from_disk(schema, &config)?;
            tables.insert(name, table);
        }
        info!(database = %config.database, tables = tables.len(), "catalog opened");
        Ok(Catalog { config, tables })
    }

    /// Create a table from a parsed CREATE TABLE; the schema is persisted
    /// before the table becomes visible.
    pub fn create_table(&mut self, stmt: &CreateTableStmt) -> MinipgResult<()> {
        if self.tables.contains_key(&stmt.name) {
            return Err(MinipgError::TableExisted(stmt.name.clone()));
        }
        let schema = Schema::new(&stmt.name, stmt.columns.clone());
        let table = Table::create(schema, &self.config)?;
        self.tables.insert(stmt.name.clone(), table);
        Ok(())
    }

    pub fn get(&self, name: &str) -> MinipgResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| MinipgError::TableNotExisted(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> MinipgResult<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| MinipgError::TableNotExisted(name.to_string()))
    }

    /// All table names, sorted for stable listings.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn config(&self) -> &Config {
        &self.config
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

    fn create_users() -> CreateTableStmt {
        CreateTableStmt {
            name: "users".to_string(),
            columns: vec![
                Column::new("name", ColumnKind::Text),
                Column::new("age", ColumnKind::Int),
            ],
        }
    }

    #[test]
    fn open_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::open(temp_config(&dir)).unwrap();
        assert!(catalog.table_names().is_empty());
    }

    #[test]
    fn create_table_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(temp_config(&dir)).unwrap();
        catalog.create_table(&create_users()).unwrap();

        assert_eq!(catalog.table_names(), vec!["users"]);
        assert_eq!(catalog.get("users").unwrap().name(), "users");
        assert!(matches!(
            catalog.get("missing").unwrap_err(),
            MinipgError::TableNotExisted(_)
        ));
    }

    #[test]
    fn duplicate_create_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(temp_config(&dir)).unwrap();
        catalog.create_table(&create_users()).unwrap();
        assert!(matches!(
            catalog.create_table(&create_users()).unwrap_err(),
            MinipgError::TableExisted(_)
        ));
    }

    #[test]
    fn reopen_restores_created_tables() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        {
            let mut catalog = Catalog::open(config.clone()).unwrap();
            catalog.create_table(&create_users()).unwrap();
        }

        let catalog = Catalog::open(config).unwrap();
        assert_eq!(catalog.table_names(), vec!["users"]);
        let table = catalog.get("users").unwrap();
        assert_eq!(table.schema.column_names, vec!["name", "age"]);
    }
}
