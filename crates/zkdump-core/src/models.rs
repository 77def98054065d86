//! Data models for zkdump
//!
//! Defines the records decoded from a snapshot dump: the header, znode
//! records, session records, and the database that holds them.
//! Everything here is built once by the decoder and read-only afterwards.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Dump header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Last transaction id the server processed before the snapshot
    pub last_processed_zxid: u64,
}

/// A single znode as it appeared in the dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRecord {
    pub(crate) path: String,
    pub(crate) czxid: u64,
    pub(crate) ctime: DateTime<FixedOffset>,
    pub(crate) mzxid: u64,
    pub(crate) mtime: DateTime<FixedOffset>,
    pub(crate) pzxid: u64,
    pub(crate) cversion: i32,
    pub(crate) data_version: i32,
    pub(crate) acl_version: i32,
    pub(crate) ephemeral_owner: u64,
    #[serde(skip)]
    pub(crate) data: Vec<u8>,
}

impl NodeRecord {
    /// Absolute path of the node
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Transaction id that created the node
    pub fn czxid(&self) -> u64 {
        self.czxid
    }

    /// Creation time
    pub fn ctime(&self) -> DateTime<FixedOffset> {
        self.ctime
    }

    /// Transaction id of the last modification
    pub fn mzxid(&self) -> u64 {
        self.mzxid
    }

    /// Last modification time
    pub fn mtime(&self) -> DateTime<FixedOffset> {
        self.mtime
    }

    /// Transaction id of the last change to the children list
    pub fn pzxid(&self) -> u64 {
        self.pzxid
    }

    pub fn cversion(&self) -> i32 {
        self.cversion
    }

    pub fn data_version(&self) -> i32 {
        self.data_version
    }

    pub fn acl_version(&self) -> i32 {
        self.acl_version
    }

    /// Owning session id, zero for persistent nodes
    pub fn ephemeral_owner(&self) -> u64 {
        self.ephemeral_owner
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral_owner != 0
    }

    /// Node payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Structural depth of the node path
    pub fn depth(&self) -> usize {
        depth(&self.path)
    }
}

/// A client session as it appeared in the dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub(crate) session_id: u64,
    pub(crate) timeout: Duration,
    pub(crate) ephemeral_count: i32,
}

impl SessionRecord {
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of ephemeral nodes owned by this session
    pub fn ephemeral_count(&self) -> i32 {
        self.ephemeral_count
    }
}

/// Decoded snapshot
///
/// Node records keep decode order; the implicit root is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDatabase {
    header: Header,
    nodes: Vec<NodeRecord>,
    sessions: Vec<SessionRecord>,
}

impl SnapshotDatabase {
    pub(crate) fn new(header: Header, nodes: Vec<NodeRecord>, sessions: Vec<SessionRecord>) -> Self {
        Self {
            header,
            nodes,
            sessions,
        }
    }

    pub fn header(&self) -> Header {
        self.header
    }

    /// Node records in decode order
    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    /// Look up a node by its path
    pub fn node(&self, path: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.path == path)
    }

    /// Node records ordered by depth, decode order within a depth
    ///
    /// Parents therefore always come before their descendants.
    pub fn nodes_by_depth(&self) -> Vec<&NodeRecord> {
        let mut sorted: Vec<&NodeRecord> = self.nodes.iter().collect();
        // sort_by_key is stable
        sorted.sort_by_key(|n| n.depth());
        sorted
    }

    /// Aggregate figures about the snapshot
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            last_processed_zxid: self.header.last_processed_zxid,
            node_count: self.nodes.len(),
            session_count: self.sessions.len(),
            ephemeral_count: self.nodes.iter().filter(|n| n.is_ephemeral()).count(),
            total_data_bytes: self.nodes.iter().map(|n| n.data.len() as u64).sum(),
            max_depth: self.nodes.iter().map(|n| n.depth()).max().unwrap_or(0),
        }
    }

    pub(crate) fn first_duplicate_path(nodes: &[NodeRecord]) -> Option<&str> {
        let mut seen = HashSet::with_capacity(nodes.len());
        nodes
            .iter()
            .find(|n| !seen.insert(n.path.as_str()))
            .map(|n| n.path.as_str())
    }
}

/// Summary of a decoded snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub last_processed_zxid: u64,
    pub node_count: usize,
    pub session_count: usize,
    pub ephemeral_count: usize,
    pub total_data_bytes: u64,
    pub max_depth: usize,
}

/// Depth of a path, counted as the number of `/` separators
///
/// `/` has depth 1, `/zookeeper/config` has depth 2.
pub fn depth(path: &str) -> usize {
    path.chars().filter(|&c| c == '/').count()
}

/// Join a node path onto a destination prefix
pub fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", path),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, path),
    }
}
