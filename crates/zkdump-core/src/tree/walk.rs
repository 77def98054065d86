//! Live subtree traversal

use serde::Serialize;
use thiserror::Error;

use crate::models::join_path;
use crate::remote::{Namespace, NamespaceError, NodeStat};

/// Errors while walking a subtree
#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Failed to get children of '{path}': {source}")]
    List {
        path: String,
        #[source]
        source: NamespaceError,
    },

    #[error("Subtree below '{path}' is deeper than the limit of {max_depth} levels")]
    TooDeep { path: String, max_depth: usize },
}

/// Visit `root` and every node below it in pre-order
///
/// A node is visited before its children, and children in the order the
/// namespace lists them. A listing failure aborts the walk; the visitor
/// keeps whatever it already saw.
pub async fn walk<N, F>(ns: &N, root: &str, max_depth: usize, mut visit: F) -> Result<(), WalkError>
where
    N: Namespace + ?Sized,
    F: FnMut(&str, &NodeStat),
{
    let mut stack = vec![(root.to_string(), 0usize)];

    while let Some((path, depth)) = stack.pop() {
        let (children, stat) = ns
            .list_children(&path)
            .await
            .map_err(|source| WalkError::List {
                path: path.clone(),
                source,
            })?;

        visit(&path, &stat);

        if children.is_empty() {
            continue;
        }
        if depth >= max_depth {
            return Err(WalkError::TooDeep { path, max_depth });
        }
        // Reversed so the first listed child is popped first
        stack.extend(
            children
                .iter()
                .rev()
                .map(|c| (join_path(&path, c), depth + 1)),
        );
    }

    Ok(())
}

/// Aggregate payload size of a subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    /// Nodes visited, including the root
    pub nodes: usize,
    /// Sum of the nodes' data lengths in bytes
    pub total_bytes: u64,
}

/// Sum the data length of `root` and all its descendants
pub async fn disk_usage<N>(ns: &N, root: &str, max_depth: usize) -> Result<DiskUsage, WalkError>
where
    N: Namespace + ?Sized,
{
    let mut usage = DiskUsage::default();
    walk(ns, root, max_depth, |_, stat| {
        usage.nodes += 1;
        usage.total_bytes += u64::try_from(stat.data_length).unwrap_or(0);
    })
    .await?;
    Ok(usage)
}
