//! # minipg — a minimal relational database engine
//!
//! A Postgres-flavored toy engine: typed tables, an append-only binary row
//! log, and dual secondary indexes per column (a disk-persisted B-tree and a
//! skip-list-fronted LSM-tree). Statements arrive parsed; the executor
//! dispatches them over an explicit catalog value.
//!
//! ## Quick start
//!
//! ```rust
//! use minipg_core::config::Config;
//! use minipg_core::sql::{SqlParser, execute};
//! use minipg_core::storage::Catalog;
//!
//! # fn main() -> minipg_core::MinipgResult<()> {
//! # let dir = tempfile::tempdir().unwrap();
//! # let config = Config {
//! #     database: "demo".to_string(),
//! #     scheme_dir: dir.path().join("scheme"),
//! #     data_dir: dir.path().join("data"),
//! #     index_dir: dir.path().join("index"),
//! #     mode: "memory".to_string(),
//! # };
//! let mut catalog = Catalog::open(config)?;
//! let parser = SqlParser::new();
//!
//! execute(&mut catalog, &parser.parse("create table users (name text, age int)")?)?;
//! execute(&mut catalog, &parser.parse("insert into users values ('a', 11)")?)?;
//! let result = execute(&mut catalog, &parser.parse("select * from users where name = 'a'")?)?;
//! # let _ = result;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module structure
//! - [`storage`] — schema, row codec, table engine, catalog
//! - [`index`] — per-column B-tree + LSM-tree index pairs
//! - [`sql`] — statement types, parser, executor
//! - [`config`] — resolved directory layout
//! - [`error`] — unified error type
//!
//! Single-threaded by design: one statement at a time, no locks, no
//! transactions.

pub mod config;
pub mod error;
pub mod index;
pub mod sql;
pub mod storage;

// Logging utilities
pub mod logging;

// Re-export commonly used types
pub use config::Config;
pub use error::{MinipgError, MinipgResult};
pub use storage::{Catalog, Field, Row};
