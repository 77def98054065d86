//! ZooKeeper namespace
//!
//! [`Namespace`] implementation backed by `zookeeper-client`.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use thiserror::Error;
use tracing::{debug, info};
use zookeeper_client as zk;

use super::{ConnectionEvent, Namespace, NamespaceError, NodeStat};

/// Errors establishing a session
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("No ZooKeeper hosts configured")]
    NoHosts,

    #[error("Failed to connect to ZooKeeper at '{cluster}': {source}")]
    Connect {
        cluster: String,
        #[source]
        source: zk::Error,
    },
}

/// Live ZooKeeper session
#[derive(Clone)]
pub struct ZkNamespace {
    client: zk::Client,
    cluster: String,
}

impl ZkNamespace {
    /// Connect to an ensemble
    ///
    /// Returns the handle together with the stream of connectivity changes
    /// for the new session. The stream ends after a terminal state.
    pub async fn connect(
        hosts: &[String],
        session_timeout: Duration,
    ) -> Result<(Self, BoxStream<'static, ConnectionEvent>), ConnectError> {
        let cluster = cluster_string(hosts).ok_or(ConnectError::NoHosts)?;

        info!("Connecting to {}", cluster);
        let client = zk::Client::connector()
            .session_timeout(session_timeout)
            .connect(&cluster)
            .await
            .map_err(|source| ConnectError::Connect {
                cluster: cluster.clone(),
                source,
            })?;
        debug!("Session established with {}", cluster);

        let events = stream::unfold(Some(client.state_watcher()), |watcher| async move {
            let mut watcher = watcher?;
            let event = connection_event(watcher.changed().await);
            let next = if event.is_terminal() {
                None
            } else {
                Some(watcher)
            };
            Some((event, next))
        })
        .boxed();

        Ok((Self { client, cluster }, events))
    }

    /// Connection string this session was opened with
    pub fn cluster(&self) -> &str {
        &self.cluster
    }
}

#[async_trait]
impl Namespace for ZkNamespace {
    async fn list_children(&self, path: &str) -> Result<(Vec<String>, NodeStat), NamespaceError> {
        let (children, stat) = self.client.get_children(path).await.map_err(namespace_error)?;
        Ok((children, node_stat(&stat)))
    }

    async fn create(&self, path: &str, data: &[u8]) -> Result<(), NamespaceError> {
        let options = zk::CreateMode::Persistent.with_acls(zk::Acls::anyone_all());
        self.client
            .create(path, data, &options)
            .await
            .map_err(namespace_error)?;
        Ok(())
    }

    async fn set_data(
        &self,
        path: &str,
        data: &[u8],
        version: Option<i32>,
    ) -> Result<NodeStat, NamespaceError> {
        let stat = self
            .client
            .set_data(path, data, version)
            .await
            .map_err(namespace_error)?;
        Ok(node_stat(&stat))
    }

    async fn delete(&self, path: &str, version: Option<i32>) -> Result<(), NamespaceError> {
        self.client
            .delete(path, version)
            .await
            .map_err(namespace_error)
    }

    async fn sync(&self, path: &str) -> Result<(), NamespaceError> {
        self.client.sync(path).await.map_err(namespace_error)
    }
}

/// Join host entries into a connection string, `None` when empty
fn cluster_string(hosts: &[String]) -> Option<String> {
    let hosts: Vec<&str> = hosts
        .iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
        .collect();
    if hosts.is_empty() {
        None
    } else {
        Some(hosts.join(","))
    }
}

fn namespace_error(error: zk::Error) -> NamespaceError {
    match error {
        zk::Error::NodeExists => NamespaceError::NodeExists,
        zk::Error::NoNode => NamespaceError::NoNode,
        zk::Error::NotEmpty => NamespaceError::NotEmpty,
        zk::Error::BadVersion => NamespaceError::BadVersion,
        zk::Error::ConnectionLoss => NamespaceError::ConnectionLoss,
        other => NamespaceError::Other(other.to_string()),
    }
}

fn node_stat(stat: &zk::Stat) -> NodeStat {
    NodeStat {
        czxid: stat.czxid,
        mzxid: stat.mzxid,
        pzxid: stat.pzxid,
        ctime: stat.ctime,
        mtime: stat.mtime,
        version: stat.version,
        cversion: stat.cversion,
        aversion: stat.aversion,
        ephemeral_owner: stat.ephemeral_owner,
        data_length: stat.data_length,
        num_children: stat.num_children,
    }
}

fn connection_event(state: zk::SessionState) -> ConnectionEvent {
    match state {
        zk::SessionState::SyncConnected => ConnectionEvent::Connected,
        zk::SessionState::ConnectedReadOnly => ConnectionEvent::ConnectedReadOnly,
        zk::SessionState::Disconnected => ConnectionEvent::Disconnected,
        zk::SessionState::AuthFailed => ConnectionEvent::AuthFailed,
        zk::SessionState::Expired => ConnectionEvent::Expired,
        zk::SessionState::Closed => ConnectionEvent::Closed,
        #[allow(unreachable_patterns)]
        _ => ConnectionEvent::Disconnected,
    }
}
