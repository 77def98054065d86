//! Replaying a snapshot into a live namespace
//!
//! Records are applied parents first: they are stable-sorted by depth, so
//! siblings keep their dump order. Individual node failures are collected
//! in the [`SyncReport`] and never stop the run; only a failed pre-clear
//! aborts it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::delete::{delete_subtree, DeleteError};
use crate::models::{join_path, SnapshotDatabase};
use crate::remote::{Namespace, NamespaceError};

/// Default limit for recursive traversals
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// What to do when a node already exists at the destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Replace the payload, ignoring the existing version
    Overwrite,
    /// Leave the existing node untouched
    #[default]
    Skip,
}

/// Options for a single import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Destination path the dump is restored under
    pub prefix: String,
    pub policy: ConflictPolicy,
    /// Remove the destination subtree before writing anything
    pub pre_clear: bool,
    /// Depth limit for the pre-clear traversal
    pub max_depth: usize,
}

impl ImportOptions {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            policy: ConflictPolicy::default(),
            pre_clear: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_pre_clear(mut self, pre_clear: bool) -> Self {
        self.pre_clear = pre_clear;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Receives one status line per processed node
pub trait ImportProgress {
    fn node_processed(&self, status: &str);
}

impl<F: Fn(&str)> ImportProgress for F {
    fn node_processed(&self, status: &str) {
        self(status)
    }
}

/// Progress sink that drops every update
pub struct NoProgress;

impl ImportProgress for NoProgress {
    fn node_processed(&self, _status: &str) {}
}

/// Result of applying one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum NodeOutcome {
    Created,
    Overwritten,
    /// Already existed and the policy is [`ConflictPolicy::Skip`]
    Skipped,
    Failed {
        action: &'static str,
        reason: String,
    },
}

/// Outcome for one destination path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeReport {
    pub path: String,
    #[serde(flatten)]
    pub outcome: NodeOutcome,
}

impl fmt::Display for NodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            NodeOutcome::Created => write!(f, "created {}", self.path),
            NodeOutcome::Overwritten => write!(f, "overwrote {}", self.path),
            NodeOutcome::Skipped => write!(f, "skipped {} (exists)", self.path),
            NodeOutcome::Failed { action, reason } => {
                write!(f, "{} {} failed: {}", action, self.path, reason)
            }
        }
    }
}

/// Aggregated outcome of an import run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub prefix: String,
    /// Nodes removed by the pre-clear pass
    pub cleared: usize,
    /// Per-node outcomes in the order they were applied
    pub nodes: Vec<NodeReport>,
    /// The prefix could not be created
    pub prefix_warning: Option<String>,
    /// The final sync barrier failed
    pub barrier_warning: Option<String>,
}

impl SyncReport {
    fn count(&self, pred: impl Fn(&NodeOutcome) -> bool) -> usize {
        self.nodes.iter().filter(|n| pred(&n.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, NodeOutcome::Created))
    }

    pub fn overwritten(&self) -> usize {
        self.count(|o| matches!(o, NodeOutcome::Overwritten))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, NodeOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, NodeOutcome::Failed { .. }))
    }

    /// Per-node failures
    pub fn failures(&self) -> impl Iterator<Item = &NodeReport> {
        self.nodes
            .iter()
            .filter(|n| matches!(n.outcome, NodeOutcome::Failed { .. }))
    }

    /// Nothing failed and no warning was raised
    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.prefix_warning.is_none() && self.barrier_warning.is_none()
    }
}

/// Fatal synchronization errors
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to clear '{prefix}' before import: {source}")]
    PreClear {
        prefix: String,
        #[source]
        source: DeleteError,
    },
}

/// Applies decoded records to a namespace
pub struct TreeSynchronizer<'a, N: ?Sized> {
    ns: &'a N,
    options: ImportOptions,
}

impl<'a, N> TreeSynchronizer<'a, N>
where
    N: Namespace + ?Sized,
{
    pub fn new(ns: &'a N, options: ImportOptions) -> Self {
        Self { ns, options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Apply every record of `db` under the prefix
    pub async fn run(
        &self,
        db: &SnapshotDatabase,
        progress: &dyn ImportProgress,
    ) -> Result<SyncReport, SyncError> {
        let prefix = self.options.prefix.as_str();
        let mut report = SyncReport {
            prefix: prefix.to_string(),
            ..SyncReport::default()
        };

        if self.options.pre_clear {
            report.cleared = self.clear().await?;
        }

        if let Err(e) = self.ensure_prefix().await {
            warn!("Prefix {} is not usable: {}", prefix, e);
            report.prefix_warning = Some(e);
        }

        let records = db.nodes_by_depth();
        info!("Importing {} znodes under {}", records.len(), prefix);

        for record in records {
            let path = join_path(prefix, record.path());
            let outcome = self.apply(&path, record.data()).await;
            let node = NodeReport { path, outcome };

            if matches!(node.outcome, NodeOutcome::Failed { .. }) {
                warn!("{}", node);
            } else {
                debug!("{}", node);
            }
            progress.node_processed(&node.to_string());
            report.nodes.push(node);
        }

        if let Err(e) = self.ns.sync(prefix).await {
            warn!("Sync of {} failed: {}", prefix, e);
            report.barrier_warning = Some(format!("sync {} failed: {}", prefix, e));
        }

        info!(
            "Import finished: {} created, {} overwritten, {} skipped, {} failed",
            report.created(),
            report.overwritten(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    /// Remove the destination subtree; a missing prefix is already clear
    async fn clear(&self) -> Result<usize, SyncError> {
        let prefix = self.options.prefix.as_str();
        match delete_subtree(self.ns, prefix, self.options.max_depth).await {
            Ok(deleted) => {
                info!("Cleared {} znodes under {}", deleted, prefix);
                Ok(deleted)
            }
            Err(e) if e.is_missing_root(prefix) => Ok(0),
            Err(source) => Err(SyncError::PreClear {
                prefix: prefix.to_string(),
                source,
            }),
        }
    }

    /// Create the prefix and any missing ancestors as empty nodes
    async fn ensure_prefix(&self) -> Result<(), String> {
        let prefix = self.options.prefix.as_str();
        match self.ns.list_children(prefix).await {
            Ok(_) => return Ok(()),
            Err(NamespaceError::NoNode) => {}
            Err(e) => return Err(format!("list {} failed: {}", prefix, e)),
        }

        let mut current = String::new();
        for part in prefix.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            match self.ns.create(&current, &[]).await {
                Ok(()) => info!("Created {}", current),
                Err(NamespaceError::NodeExists) => {}
                Err(e) => return Err(format!("create {} failed: {}", current, e)),
            }
        }
        Ok(())
    }

    async fn apply(&self, path: &str, data: &[u8]) -> NodeOutcome {
        match self.ns.create(path, data).await {
            Ok(()) => NodeOutcome::Created,
            Err(NamespaceError::NodeExists) => match self.options.policy {
                ConflictPolicy::Skip => NodeOutcome::Skipped,
                ConflictPolicy::Overwrite => match self.ns.set_data(path, data, None).await {
                    Ok(_) => NodeOutcome::Overwritten,
                    Err(e) => NodeOutcome::Failed {
                        action: "set",
                        reason: e.to_string(),
                    },
                },
            },
            Err(e) => NodeOutcome::Failed {
                action: "create",
                reason: e.to_string(),
            },
        }
    }
}
