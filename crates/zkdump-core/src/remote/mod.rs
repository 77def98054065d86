//! Remote namespace access
//!
//! The tree operations in this crate talk to ZooKeeper through the
//! [`Namespace`] trait so the same code runs against a live ensemble
//! ([`ZkNamespace`]) or an in-memory tree ([`MemoryNamespace`]).
//!
//! ## Usage
//!
//! ```ignore
//! let (ns, events) = ZkNamespace::connect(&hosts, Duration::from_secs(10)).await?;
//! let watcher = EventWatcher::spawn(events);
//! let (children, stat) = ns.list_children("/").await?;
//! watcher.stop().await;
//! ```

mod memory;
mod zk;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use memory::{MemoryNamespace, Mutation};
pub use zk::{ConnectError, ZkNamespace};

/// Errors returned by namespace operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("node already exists")]
    NodeExists,

    #[error("node does not exist")]
    NoNode,

    #[error("node has children")]
    NotEmpty,

    #[error("version does not match")]
    BadVersion,

    #[error("connection lost")]
    ConnectionLoss,

    #[error("{0}")]
    Other(String),
}

/// Metadata reported for a live node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeStat {
    pub czxid: i64,
    pub mzxid: i64,
    pub pzxid: i64,
    pub ctime: i64,
    pub mtime: i64,
    /// Data version
    pub version: i32,
    pub cversion: i32,
    pub aversion: i32,
    pub ephemeral_owner: i64,
    /// Payload size in bytes
    pub data_length: i32,
    pub num_children: i32,
}

/// Connectivity change of the underlying session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    ConnectedReadOnly,
    Disconnected,
    AuthFailed,
    Expired,
    Closed,
}

impl ConnectionEvent {
    /// The session can not recover from this state
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConnectionEvent::AuthFailed | ConnectionEvent::Expired | ConnectionEvent::Closed
        )
    }
}

/// Hierarchical, versioned key space
///
/// Every call completes when the server answers or the session timeout
/// elapses; a timeout surfaces as an ordinary error.
#[async_trait]
pub trait Namespace: Send + Sync {
    /// Child names of `path` (not full paths) and the stat of `path` itself
    async fn list_children(&self, path: &str) -> Result<(Vec<String>, NodeStat), NamespaceError>;

    /// Create a persistent node with an open ACL
    async fn create(&self, path: &str, data: &[u8]) -> Result<(), NamespaceError>;

    /// Replace the payload of `path`; `None` skips the version check
    async fn set_data(
        &self,
        path: &str,
        data: &[u8],
        version: Option<i32>,
    ) -> Result<NodeStat, NamespaceError>;

    /// Delete a childless node; `None` skips the version check
    async fn delete(&self, path: &str, version: Option<i32>) -> Result<(), NamespaceError>;

    /// Wait until the connected server has caught up with the leader for `path`
    async fn sync(&self, path: &str) -> Result<(), NamespaceError>;
}
