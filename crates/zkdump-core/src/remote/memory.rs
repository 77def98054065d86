//! In-memory namespace
//!
//! Keeps a whole tree in a `BTreeMap` and records every successful
//! mutation in a journal, so callers can check exactly what was written
//! and in which order. Follows ZooKeeper's structural rules: a node needs
//! an existing parent and can only be deleted once it has no children.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{Namespace, NamespaceError, NodeStat};

/// Mutation recorded by [`MemoryNamespace`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(String),
    SetData(String),
    Delete(String),
    Sync(String),
}

#[derive(Debug, Clone, Default)]
struct Entry {
    data: Vec<u8>,
    version: i32,
    cversion: i32,
    /// Child names in creation order
    children: Vec<String>,
    czxid: i64,
    mzxid: i64,
    pzxid: i64,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: BTreeMap<String, Entry>,
    journal: Vec<Mutation>,
    zxid: i64,
    /// Paths whose operations fail with a generic error
    failing: HashSet<String>,
}

/// Namespace held entirely in memory
#[derive(Debug)]
pub struct MemoryNamespace {
    tree: Mutex<Tree>,
}

impl Default for MemoryNamespace {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNamespace {
    /// Create a namespace containing only the root
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Entry::default());
        Self {
            tree: Mutex::new(Tree {
                nodes,
                ..Tree::default()
            }),
        }
    }

    /// Create a node and any missing ancestors without journaling
    pub fn seed(&self, path: &str, data: &[u8]) {
        let mut tree = self.lock();
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            if !tree.nodes.contains_key(&current) {
                tree.insert(&current, Vec::new());
            }
        }
        if let Some(entry) = tree.nodes.get_mut(path) {
            entry.data = data.to_vec();
        }
    }

    /// Make every operation on `path` fail
    pub fn fail_on(&self, path: &str) {
        self.lock().failing.insert(path.to_string());
    }

    /// Payload of a node, if it exists
    pub fn data(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().nodes.get(path).map(|e| e.data.clone())
    }

    /// Data version of a node, if it exists
    pub fn version(&self, path: &str) -> Option<i32> {
        self.lock().nodes.get(path).map(|e| e.version)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lock().nodes.contains_key(path)
    }

    /// All paths, sorted
    pub fn paths(&self) -> Vec<String> {
        self.lock().nodes.keys().cloned().collect()
    }

    /// Successful mutations in the order they happened
    pub fn journal(&self) -> Vec<Mutation> {
        self.lock().journal.clone()
    }

    /// Paths created, in order
    pub fn created(&self) -> Vec<String> {
        self.lock()
            .journal
            .iter()
            .filter_map(|m| match m {
                Mutation::Create(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    /// Paths deleted, in order
    pub fn deleted(&self) -> Vec<String> {
        self.lock()
            .journal
            .iter()
            .filter_map(|m| match m {
                Mutation::Delete(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        // A poisoned lock only means a test panicked mid-operation
        self.tree.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Tree {
    fn check(&self, path: &str) -> Result<(), NamespaceError> {
        if self.failing.contains(path) {
            return Err(NamespaceError::Other(format!("injected failure on {}", path)));
        }
        if !path.starts_with('/') || (path.len() > 1 && path.ends_with('/')) {
            return Err(NamespaceError::Other(format!("invalid path '{}'", path)));
        }
        Ok(())
    }

    fn insert(&mut self, path: &str, data: Vec<u8>) {
        self.zxid += 1;
        let zxid = self.zxid;
        let (parent, name) = split_parent(path);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(name.to_string());
            parent.cversion += 1;
            parent.pzxid = zxid;
        }
        self.nodes.insert(
            path.to_string(),
            Entry {
                data,
                czxid: zxid,
                mzxid: zxid,
                pzxid: zxid,
                ..Entry::default()
            },
        );
    }

    fn stat(entry: &Entry) -> NodeStat {
        NodeStat {
            czxid: entry.czxid,
            mzxid: entry.mzxid,
            pzxid: entry.pzxid,
            version: entry.version,
            cversion: entry.cversion,
            data_length: entry.data.len() as i32,
            num_children: entry.children.len() as i32,
            ..NodeStat::default()
        }
    }
}

/// Split `/a/b` into (`/a`, `b`) and `/a` into (`/`, `a`)
fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("/", path),
    }
}

#[async_trait]
impl Namespace for MemoryNamespace {
    async fn list_children(&self, path: &str) -> Result<(Vec<String>, NodeStat), NamespaceError> {
        let tree = self.lock();
        tree.check(path)?;
        let entry = tree.nodes.get(path).ok_or(NamespaceError::NoNode)?;
        Ok((entry.children.clone(), Tree::stat(entry)))
    }

    async fn create(&self, path: &str, data: &[u8]) -> Result<(), NamespaceError> {
        let mut tree = self.lock();
        tree.check(path)?;
        if tree.nodes.contains_key(path) {
            return Err(NamespaceError::NodeExists);
        }
        let (parent, _) = split_parent(path);
        if !tree.nodes.contains_key(parent) {
            return Err(NamespaceError::NoNode);
        }
        tree.insert(path, data.to_vec());
        tree.journal.push(Mutation::Create(path.to_string()));
        Ok(())
    }

    async fn set_data(
        &self,
        path: &str,
        data: &[u8],
        version: Option<i32>,
    ) -> Result<NodeStat, NamespaceError> {
        let mut tree = self.lock();
        tree.check(path)?;
        tree.zxid += 1;
        let zxid = tree.zxid;
        let entry = tree.nodes.get_mut(path).ok_or(NamespaceError::NoNode)?;
        if version.is_some_and(|v| v != entry.version) {
            return Err(NamespaceError::BadVersion);
        }
        entry.data = data.to_vec();
        entry.version += 1;
        entry.mzxid = zxid;
        let stat = Tree::stat(entry);
        tree.journal.push(Mutation::SetData(path.to_string()));
        Ok(stat)
    }

    async fn delete(&self, path: &str, version: Option<i32>) -> Result<(), NamespaceError> {
        let mut tree = self.lock();
        tree.check(path)?;
        let entry = tree.nodes.get(path).ok_or(NamespaceError::NoNode)?;
        if !entry.children.is_empty() {
            return Err(NamespaceError::NotEmpty);
        }
        if version.is_some_and(|v| v != entry.version) {
            return Err(NamespaceError::BadVersion);
        }
        tree.nodes.remove(path);
        let (parent, name) = split_parent(path);
        if let Some(parent) = tree.nodes.get_mut(parent) {
            parent.children.retain(|c| c != name);
            parent.cversion += 1;
        }
        tree.journal.push(Mutation::Delete(path.to_string()));
        Ok(())
    }

    async fn sync(&self, path: &str) -> Result<(), NamespaceError> {
        let mut tree = self.lock();
        tree.check(path)?;
        if !tree.nodes.contains_key(path) {
            return Err(NamespaceError::NoNode);
        }
        tree.journal.push(Mutation::Sync(path.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_parent() {
        assert_eq!(split_parent("/a"), ("/", "a"));
        assert_eq!(split_parent("/a/b"), ("/a", "b"));
    }

    #[tokio::test]
    async fn test_create_requires_parent() {
        let ns = MemoryNamespace::new();
        assert_eq!(ns.create("/a/b", b"").await, Err(NamespaceError::NoNode));
        ns.create("/a", b"x").await.unwrap();
        ns.create("/a/b", b"y").await.unwrap();
        assert_eq!(ns.create("/a", b"").await, Err(NamespaceError::NodeExists));
        assert_eq!(ns.created(), vec!["/a", "/a/b"]);
    }

    #[tokio::test]
    async fn test_delete_requires_no_children() {
        let ns = MemoryNamespace::new();
        ns.seed("/a/b", b"");
        assert_eq!(ns.delete("/a", None).await, Err(NamespaceError::NotEmpty));
        ns.delete("/a/b", None).await.unwrap();
        ns.delete("/a", None).await.unwrap();
        assert_eq!(ns.paths(), vec!["/"]);
    }

    #[tokio::test]
    async fn test_set_data_versions() {
        let ns = MemoryNamespace::new();
        ns.seed("/a", b"old");
        let stat = ns.set_data("/a", b"new", None).await.unwrap();
        assert_eq!(stat.version, 1);
        assert_eq!(stat.data_length, 3);
        assert_eq!(
            ns.set_data("/a", b"newer", Some(0)).await,
            Err(NamespaceError::BadVersion)
        );
        assert_eq!(ns.data("/a").unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_list_children_in_creation_order() {
        let ns = MemoryNamespace::new();
        ns.seed("/p/z", b"");
        ns.seed("/p/a", b"");
        let (children, stat) = ns.list_children("/p").await.unwrap();
        assert_eq!(children, vec!["z", "a"]);
        assert_eq!(stat.num_children, 2);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let ns = MemoryNamespace::new();
        ns.fail_on("/broken");
        assert!(matches!(
            ns.create("/broken", b"").await,
            Err(NamespaceError::Other(_))
        ));
    }
}
