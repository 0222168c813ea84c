//! Skip list, the in-memory ordered structure backing the LSM memtable.
//!
//! A tower of singly linked sorted lists. Every key lives in the bottom list;
//! a key also appears in each higher level it was promoted into, so the set of
//! levels holding a key is always a prefix of the tower. Nodes live in an
//! arena and link by index, so no owning pointers cross levels.
//!
//! Not thread-safe; at most one caller at a time.

use crate::index::{IndexData, IndexKey};

/// Decides whether an inserted key is promoted into the next level up.
///
/// The default is a fair coin; tests substitute the deterministic variant to
/// pin the tower shape.
#[derive(Debug, Clone, Copy)]
pub enum Promoter {
    /// Promote on a coin flip.
    Random,
    /// Always (`true`) or never (`false`) promote.
    Deterministic(bool),
}

impl Promoter {
    fn should_insert(&self) -> bool {
        match self {
            Promoter::Random => rand::random::<bool>(),
            Promoter::Deterministic(up) => *up,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    key: String,
    data: IndexData,
    right: Option<usize>,
    down: Option<usize>,
}

/// Arena-backed skip list from string key to [`IndexData`].
#[derive(Debug, Clone)]
pub struct SkipList {
    nodes: Vec<Node>,
    head: usize,
    promoter: Promoter,
}

impl SkipList {
    /// A single-level list holding one entry, with the fair-coin promoter.
    pub fn new(key: &str, data: IndexData) -> SkipList {
        SkipList {
            nodes: vec![Node {
                key: key.to_string(),
                data,
                right: None,
                down: None,
            }],
            head: 0,
            promoter: Promoter::Random,
        }
    }

    /// Replace the promoter used by subsequent inserts.
    pub fn set_promoter(&mut self, promoter: Promoter) {
        self.promoter = promoter;
    }

    /// Rebuild a list from a sorted entry sequence, as read back from disk.
    pub fn from_entries(entries: &[IndexKey]) -> Option<SkipList> {
        let (first, rest) = entries.split_first()?;
        let mut list = SkipList::new(&first.name, first.data);
        for entry in rest {
            list.insert(&entry.name, entry.data);
        }
        Some(list)
    }

    /// Walk right while the next key is smaller, descend otherwise.
    pub fn search(&self, key: &str) -> Option<IndexData> {
        if self.nodes[self.head].key == key {
            return Some(self.nodes[self.head].data);
        }
        let mut p = Some(self.head);
        while let Some(i) = p {
            match self.nodes[i].right {
                Some(r) if self.nodes[r].key == key => return Some(self.nodes[r].data),
                Some(r) if self.nodes[r].key.as_str() < key => p = Some(r),
                _ => p = self.nodes[i].down,
            }
        }
        None
    }

    /// Insert `key`, or overwrite its data if it is already present.
    ///
    /// New keys splice into the bottom list and rise while the promoter
    /// allows; promotion past the current top adds a whole new level whose
    /// head repeats the head entry. A key smaller than the head entry trades
    /// places with it first, so the bottom list stays sorted from the head.
    pub fn insert(&mut self, key: &str, data: IndexData) {
        if self.search(key).is_some() {
            self.update(key, data);
            return;
        }
        if key < self.nodes[self.head].key.as_str() {
            let old_key = self.nodes[self.head].key.clone();
            let old_data = self.nodes[self.head].data;
            let mut h = Some(self.head);
            while let Some(i) = h {
                self.nodes[i].key = key.to_string();
                self.nodes[i].data = data;
                h = self.nodes[i].down;
            }
            self.insert(&old_key, old_data);
            return;
        }

        // Trace the rightmost position <= key at every level, top down.
        let mut path = Vec::new();
        let mut p = Some(self.head);
        while let Some(mut i) = p {
            while let Some(r) = self.nodes[i].right {
                if self.nodes[r].key.as_str() < key {
                    i = r;
                } else {
                    break;
                }
            }
            path.push(i);
            p = self.nodes[i].down;
        }

        // Unwind bottom-up, splicing one node per level until promotion stops.
        let mut down = None;
        let mut should_insert = true;
        while should_insert {
            let Some(pos) = path.pop() else { break };
            let right = self.nodes[pos].right;
            let idx = self.nodes.len();
            self.nodes.push(Node {
                key: key.to_string(),
                data,
                right,
                down,
            });
            self.nodes[pos].right = Some(idx);
            down = Some(idx);
            should_insert = self.promoter.should_insert();
        }

        // Promoted past the top: open a new level above the current head.
        if should_insert {
            let right = self.nodes.len();
            self.nodes.push(Node {
                key: key.to_string(),
                data,
                right: None,
                down,
            });
            let head_key = self.nodes[self.head].key.clone();
            let head_data = self.nodes[self.head].data;
            let new_head = self.nodes.len();
            self.nodes.push(Node {
                key: head_key,
                data: head_data,
                right: Some(right),
                down: Some(self.head),
            });
            self.head = new_head;
        }
    }

    /// Overwrite the data stored for `key` at every level it appears in.
    /// No-op when the key is absent.
    pub fn update(&mut self, key: &str, data: IndexData) {
        let mut level = Some(self.head);
        while let Some(h) = level {
            let mut p = Some(h);
            while let Some(i) = p {
                if self.nodes[i].key == key {
                    self.nodes[i].data = data;
                }
                p = self.nodes[i].right;
            }
            level = self.nodes[h].down;
        }
    }

    /// Unlink `key` from every level. The head entry itself cannot be
    /// removed. No-op when the key is absent.
    pub fn delete(&mut self, key: &str) {
        let mut p = Some(self.head);
        while let Some(mut i) = p {
            while let Some(r) = self.nodes[i].right {
                if self.nodes[r].key.as_str() < key {
                    i = r;
                } else {
                    break;
                }
            }
            if let Some(r) = self.nodes[i].right {
                if self.nodes[r].key == key {
                    self.nodes[i].right = self.nodes[r].right;
                }
            }
            p = self.nodes[i].down;
        }
    }

    /// The bottom-level sequence: every live key once, in sorted order.
    pub fn all_nodes(&self) -> Vec<IndexKey> {
        let mut h = self.head;
        while let Some(d) = self.nodes[h].down {
            h = d;
        }
        let mut out = Vec::new();
        let mut p = Some(h);
        while let Some(i) = p {
            out.push(IndexKey::new(&self.nodes[i].key, self.nodes[i].data));
            p = self.nodes[i].right;
        }
        out
    }

    /// Key sequences per level, top first. Debug and test aid.
    pub fn levels(&self) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        let mut level = Some(self.head);
        while let Some(h) = level {
            let mut keys = Vec::new();
            let mut p = Some(h);
            while let Some(i) = p {
                keys.push(self.nodes[i].key.clone());
                p = self.nodes[i].right;
            }
            out.push(keys);
            level = self.nodes[h].down;
        }
        out
    }
}
