//! Secondary indexes.
//!
//! Every table column carries two indexes side by side: a disk-persisted
//! [`Btree`] and an in-memory-first [`LsmTree`]. Both are fed on every row
//! insert; point lookups prefer the B-tree and fall back to the LSM-tree.

pub mod btree;
pub mod lsmtree;
pub mod skiplist;

pub use btree::{Btree, BtreeNode};
pub use lsmtree::LsmTree;
pub use skiplist::{Promoter, SkipList};

use crate::config::Config;
use crate::error::{MinipgError, MinipgResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default B-tree degree for column indexes.
const COLUMN_BTREE_DEGREE: usize = 2;

/// Location of one encoded row inside a table's row log.
///
/// `page` and `block` are reserved for a paged layout and stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexData {
    #[serde(rename = "o")]
    pub offset: u16,
    #[serde(rename = "l")]
    pub length: u16,
    #[serde(rename = "p")]
    pub page: u16,
    #[serde(rename = "b")]
    pub block: u16,
}

impl IndexData {
    pub fn new(offset: u16, length: u16, page: u16, block: u16) -> IndexData {
        IndexData {
            offset,
            length,
            page,
            block,
        }
    }
}

/// An index entry: the sortable string form of a column value plus the row
/// location it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKey {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "d")]
    pub data: IndexData,
}

impl IndexKey {
    pub fn new(name: &str, data: IndexData) -> IndexKey {
        IndexKey {
            name: name.to_string(),
            data,
        }
    }
}

/// The index pair maintained for a single column.
#[derive(Debug)]
pub struct ColumnIndex {
    btree: Btree,
    lsm: LsmTree,
}

impl ColumnIndex {
    fn insert(&mut self, name: &str, data: IndexData) {
        self.btree.insert(IndexKey::new(name, data));
        self.lsm.insert(name, data);
    }

    fn search(&mut self, name: &str) -> Option<IndexData> {
        if let Some(key) = self.btree.search(name) {
            return Some(key.data);
        }
        self.lsm.search(name)
    }
}

/// All column indexes of one table.
#[derive(Debug)]
pub struct IndexSet {
    table: String,
    columns: HashMap<String, ColumnIndex>,
}

impl IndexSet {
    /// Fresh, empty indexes for every given column.
    pub fn create(table: &str, columns: &[String], config: &Config) -> IndexSet {
        Self::build(table, columns, config, false)
    }

    /// Indexes rebuilt from the files of an earlier run; missing files yield
    /// empty trees.
    pub fn load(table: &str, columns: &[String], config: &Config) -> IndexSet {
        Self::build(table, columns, config, true)
    }

    fn build(table: &str, columns: &[String], config: &Config, from_disk: bool) -> IndexSet {
        let mut map = HashMap::with_capacity(columns.len());
        for column in columns {
            let btree_path = config.btree_path(table, column);
            let memtable_path = config.memtable_path(table, column);
            let sstable_path = config.sstable_path(table, column);
            let index = if from_disk {
                ColumnIndex {
                    btree: Btree::load(COLUMN_BTREE_DEGREE, btree_path),
                    lsm: LsmTree::load(memtable_path, sstable_path),
                }
            } else {
                ColumnIndex {
                    btree: Btree::new(COLUMN_BTREE_DEGREE, Some(btree_path)),
                    lsm: LsmTree::new(memtable_path, sstable_path),
                }
            };
            map.insert(column.clone(), index);
        }
        IndexSet {
            table: table.to_string(),
            columns: map,
        }
    }

    /// Record `name -> (offset, length, page, block)` in both of the
    /// column's indexes.
    pub fn insert(
        &mut self,
        column: &str,
        name: &str,
        offset: u16,
        length: u16,
        page: u16,
        block: u16,
    ) -> MinipgResult<()> {
        let index = self.column_mut(column)?;
        index.insert(name, IndexData::new(offset, length, page, block));
        Ok(())
    }

    /// Point lookup for a column value; B-tree first, then the LSM-tree.
    pub fn search(&mut self, column: &str, name: &str) -> MinipgResult<Option<IndexData>> {
        let index = self.column_mut(column)?;
        Ok(index.search(name))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn column_mut(&mut self, column: &str) -> MinipgResult<&mut ColumnIndex> {
        let table = self.table.clone();
        self.columns
            .get_mut(column)
            .ok_or(MinipgError::IndexNotExisted {
                table,
                column: column.to_string(),
            })
    }
}
