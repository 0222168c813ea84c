//! Disk-persistable B-tree keyed by column value.
//!
//! Degree `t` bounds every node at `2t-1` keys. Inserts split a full child
//! before descending into it; the promoted middle key widens the parent when
//! the parent has room, and otherwise the split node stays nested one level
//! down. The root itself is never split, so it may exceed `2t-1` keys.
//!
//! When a file path is configured, every insert rewrites the whole tree as a
//! JSON dump. Flush failures are logged and swallowed; the in-memory tree
//! stays authoritative.

use crate::error::MinipgResult;
use crate::index::IndexKey;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_DEGREE: usize = 2;

fn default_degree() -> usize {
    DEFAULT_DEGREE
}

/// One B-tree node; leaves and internal nodes share the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BtreeNode {
    #[serde(rename = "k")]
    pub keys: Vec<IndexKey>,
    #[serde(rename = "c", default)]
    pub children: Vec<BtreeNode>,
    #[serde(rename = "i")]
    pub is_leaf: bool,
    #[serde(rename = "l")]
    pub level: usize,
}

impl BtreeNode {
    fn leaf(level: usize) -> BtreeNode {
        BtreeNode {
            keys: Vec::new(),
            children: Vec::new(),
            is_leaf: true,
            level,
        }
    }
}

/// B-tree with configurable degree and optional backing file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Btree {
    #[serde(rename = "r")]
    pub root: BtreeNode,
    #[serde(rename = "d", default = "default_degree")]
    degree: usize,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Btree {
    /// Empty tree: a single leaf root at level 1.
    pub fn new(degree: usize, path: Option<PathBuf>) -> Btree {
        Btree {
            root: BtreeNode::leaf(1),
            degree: degree.max(2),
            path,
        }
    }

    /// Rebuild a tree from its dump file. A missing or undecodable file
    /// yields an empty tree on the same path.
    pub fn load(degree: usize, path: PathBuf) -> Btree {
        match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Btree>(&bytes) {
                Ok(mut tree) => {
                    tree.path = Some(path);
                    tree
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "btree index file undecodable, starting empty");
                    Btree::new(degree, Some(path))
                }
            },
            Err(_) => Btree::new(degree, Some(path)),
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Point lookup by key name.
    pub fn search(&self, name: &str) -> Option<&IndexKey> {
        Self::search_node(&self.root, name)
    }

    fn search_node<'a>(node: &'a BtreeNode, name: &str) -> Option<&'a IndexKey> {
        let i = node.keys.partition_point(|k| k.name.as_str() < name);
        if i < node.keys.len() && node.keys[i].name == name {
            return Some(&node.keys[i]);
        }
        if node.is_leaf {
            return None;
        }
        Self::search_node(&node.children[i], name)
    }

    /// Insert a key, then rewrite the backing file if one is configured.
    pub fn insert(&mut self, key: IndexKey) {
        let degree = self.degree;
        Self::insert_node(&mut self.root, key, degree);
        if self.path.is_some() {
            if let Err(e) = self.flush() {
                warn!(error = %e, "btree index flush failed, in-memory tree stays authoritative");
            }
        }
    }

    fn insert_node(node: &mut BtreeNode, key: IndexKey, t: usize) {
        if node.is_leaf {
            let pos = node.keys.partition_point(|k| k.name <= key.name);
            node.keys.insert(pos, key);
            return;
        }
        let mut i = node.keys.partition_point(|k| k.name <= key.name);
        if node.children[i].keys.len() == 2 * t - 1 {
            Self::split_child(node, i, t);
            i = node.keys.partition_point(|k| k.name <= key.name);
        }
        Self::insert_node(&mut node.children[i], key, t);
    }

    /// Split the full child at slot `i` around its middle key. The promoted
    /// key and the two halves widen the parent when it has room; a full
    /// parent keeps the one-key split node as the child instead.
    fn split_child(parent: &mut BtreeNode, i: usize, t: usize) {
        let child = std::mem::replace(&mut parent.children[i], BtreeNode::leaf(0));
        let BtreeNode {
            mut keys,
            mut children,
            is_leaf,
            level,
        } = child;

        let child_level = level + 1;
        let right_keys = keys.split_off(t);
        let mid = keys.pop().expect("full node has 2t-1 keys");
        let (left_children, right_children) = if is_leaf {
            (Vec::new(), Vec::new())
        } else {
            let right_children = children.split_off(t);
            children.truncate(t - 1);
            (children, right_children)
        };
        let left = BtreeNode {
            keys,
            children: left_children,
            is_leaf,
            level: child_level,
        };
        let right = BtreeNode {
            keys: right_keys,
            children: right_children,
            is_leaf,
            level: child_level,
        };

        if parent.keys.len() == 2 * t - 1 {
            // no room to widen the parent; the split node stays nested
            parent.children[i] = BtreeNode {
                keys: vec![mid],
                children: vec![left, right],
                is_leaf: false,
                level,
            };
            return;
        }

        parent.keys.insert(i, mid);
        parent.children[i] = left;
        parent.children.insert(i + 1, right);
        for c in &mut parent.children {
            c.level = parent.level + 1;
        }
    }

    /// Serialize the whole tree to the configured file, truncating first.
    pub fn flush(&self) -> MinipgResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Preorder traversal as (level, key names) pairs. Test and debug aid.
    pub fn traverse(&self) -> Vec<(usize, Vec<String>)> {
        let mut out = Vec::new();
        Self::traverse_node(&self.root, &mut out);
        out
    }

    fn traverse_node(node: &BtreeNode, out: &mut Vec<(usize, Vec<String>)>) {
        out.push((node.level, node.keys.iter().map(|k| k.name.clone()).collect()));
        for child in &node.children {
            Self::traverse_node(child, out);
        }
    }
}
