//! LSM-tree: a skip-list memtable in front of one on-disk sorted run.
//!
//! Every insert upserts into the memtable and rewrites the memtable file.
//! When the accounted memtable size reaches its limit the memtable is dumped:
//! written out as the new sstable when none exists yet, merged into the
//! existing run otherwise. On equal keys the memtable entry wins the merge,
//! so no duplicate keys survive.
//!
//! Disk failures on either file are logged and swallowed; the in-memory state
//! stays authoritative.

use crate::index::skiplist::SkipList;
use crate::index::{IndexData, IndexKey};
use std::mem;
use std::path::PathBuf;
use tracing::{debug, warn};

const MEMTABLE_SIZE_LIMIT: usize = 2 * 1024 * 1024;
const SSTABLE_SIZE_LIMIT: usize = 10 * 1024 * 1024;

/// LSM-tree over one column's keys.
#[derive(Debug, Clone)]
pub struct LsmTree {
    memtable: Option<SkipList>,
    /// Sorted run, `None` until first read from disk.
    sstable: Option<Vec<IndexKey>>,
    memtable_size: usize,
    memtable_size_limit: usize,
    #[allow(dead_code)]
    sstable_size_limit: usize,
    memtable_path: PathBuf,
    sstable_path: PathBuf,
}

impl LsmTree {
    /// Empty tree writing to the two given files.
    pub fn new(memtable_path: PathBuf, sstable_path: PathBuf) -> LsmTree {
        LsmTree {
            memtable: None,
            sstable: Some(Vec::new()),
            memtable_size: 0,
            memtable_size_limit: MEMTABLE_SIZE_LIMIT,
            sstable_size_limit: SSTABLE_SIZE_LIMIT,
            memtable_path,
            sstable_path,
        }
    }

    /// Rebuild from the files of an earlier run. A missing memtable file
    /// yields an empty memtable; the sstable is decoded lazily on first
    /// search.
    pub fn load(memtable_path: PathBuf, sstable_path: PathBuf) -> LsmTree {
        let mut tree = LsmTree::new(memtable_path, sstable_path);
        tree.sstable = None;
        if let Ok(bytes) = std::fs::read(&tree.memtable_path) {
            match serde_json::from_slice::<Vec<IndexKey>>(&bytes) {
                Ok(entries) => {
                    tree.memtable_size = entries
                        .iter()
                        .map(|e| e.name.len() + mem::size_of::<IndexData>())
                        .sum();
                    tree.memtable = SkipList::from_entries(&entries);
                }
                Err(e) => {
                    warn!(path = %tree.memtable_path.display(), error = %e,
                        "memtable file undecodable, starting empty");
                }
            }
        }
        tree
    }

    /// Override the size thresholds; non-positive values keep the defaults.
    pub fn set_limits(&mut self, memtable_limit: usize, sstable_limit: usize) {
        if memtable_limit > 0 {
            self.memtable_size_limit = memtable_limit;
        }
        if sstable_limit > 0 {
            self.sstable_size_limit = sstable_limit;
        }
    }

    /// Upsert a key, flush the memtable file, and dump into the sstable once
    /// the memtable size limit is reached.
    pub fn insert(&mut self, key: &str, data: IndexData) {
        let entry_size = key.len() + mem::size_of::<IndexData>();
        match &mut self.memtable {
            None => {
                self.memtable = Some(SkipList::new(key, data));
                self.memtable_size += entry_size;
            }
            Some(memtable) => {
                memtable.insert(key, data);
                self.memtable_size += entry_size;
            }
        }
        self.flush_memtable();
        if self.memtable_size >= self.memtable_size_limit {
            self.dump_memtable();
        }
    }

    /// Memtable first; on a miss decode the sstable from disk (once) and
    /// scan it linearly.
    pub fn search(&mut self, key: &str) -> Option<IndexData> {
        if let Some(memtable) = &self.memtable {
            if let Some(data) = memtable.search(key) {
                return Some(data);
            }
        }
        if self.sstable.is_none() {
            self.sstable = Some(self.decode_sstable());
        }
        self.sstable
            .as_ref()
            .and_then(|run| run.iter().find(|k| k.name == key))
            .map(|k| k.data)
    }

    /// Rewrite the memtable file from the current bottom-level sequence.
    fn flush_memtable(&mut self) {
        let Some(memtable) = &self.memtable else {
            return;
        };
        if let Err(e) = write_run(&self.memtable_path, &memtable.all_nodes()) {
            warn!(path = %self.memtable_path.display(), error = %e, "memtable flush failed");
        }
    }

    /// Roll the memtable into the sstable and reset the memtable.
    fn dump_memtable(&mut self) {
        let Some(memtable) = self.memtable.take() else {
            return;
        };
        let c0 = memtable.all_nodes();

        let on_disk = std::fs::metadata(&self.sstable_path)
            .map(|m| m.len())
            .unwrap_or(0);
        let merged = if on_disk == 0 {
            c0
        } else {
            let c1 = match self.sstable.take() {
                Some(run) => run,
                None => self.decode_sstable(),
            };
            merge_runs(c0, c1)
        };

        debug!(path = %self.sstable_path.display(), keys = merged.len(), "dumping memtable");
        if let Err(e) = write_run(&self.sstable_path, &merged) {
            warn!(path = %self.sstable_path.display(), error = %e, "sstable write failed");
        }
        self.sstable = Some(merged);
        self.memtable_size = 0;
    }

    fn decode_sstable(&self) -> Vec<IndexKey> {
        let Ok(bytes) = std::fs::read(&self.sstable_path) else {
            return Vec::new();
        };
        match serde_json::from_slice(&bytes) {
            Ok(run) => run,
            Err(e) => {
                warn!(path = %self.sstable_path.display(), error = %e,
                    "sstable file undecodable, treating as empty");
                Vec::new()
            }
        }
    }
}

/// Two-way merge of sorted runs; on equal keys the newer `c0` entry wins and
/// both cursors advance.
fn merge_runs(c0: Vec<IndexKey>, c1: Vec<IndexKey>) -> Vec<IndexKey> {
    let mut out = Vec::with_capacity(c0.len() + c1.len());
    let mut newer = c0.into_iter().peekable();
    let mut older = c1.into_iter().peekable();
    loop {
        match (newer.peek(), older.peek()) {
            (Some(a), Some(b)) => match a.name.cmp(&b.name) {
                std::cmp::Ordering::Less => out.push(newer.next().unwrap()),
                std::cmp::Ordering::Greater => out.push(older.next().unwrap()),
                std::cmp::Ordering::Equal => {
                    out.push(newer.next().unwrap());
                    older.next();
                }
            },
            (Some(_), None) => out.push(newer.next().unwrap()),
            (None, Some(_)) => out.push(older.next().unwrap()),
            (None, None) => break,
        }
    }
    out
}

fn write_run(path: &std::path::Path, run: &[IndexKey]) -> crate::error::MinipgResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec(run)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
