//! Recursive subtree removal

use thiserror::Error;
use tracing::debug;

use crate::models::join_path;
use crate::remote::{Namespace, NamespaceError};

/// Errors while removing a subtree
///
/// The namespace may be partially deleted when any of these is returned.
#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("Failed to list children of '{path}': {source}")]
    List {
        path: String,
        #[source]
        source: NamespaceError,
    },

    #[error("Failed to delete '{path}': {source}")]
    Delete {
        path: String,
        #[source]
        source: NamespaceError,
    },

    #[error("Subtree below '{path}' is deeper than the limit of {max_depth} levels")]
    TooDeep { path: String, max_depth: usize },
}

impl DeleteError {
    /// Path the failure happened on
    pub fn path(&self) -> &str {
        match self {
            DeleteError::List { path, .. }
            | DeleteError::Delete { path, .. }
            | DeleteError::TooDeep { path, .. } => path,
        }
    }

    /// The root itself did not exist
    pub fn is_missing_root(&self, root: &str) -> bool {
        matches!(
            self,
            DeleteError::List { path, source: NamespaceError::NoNode } if path == root
        )
    }
}

/// Remove `root` and everything below it
///
/// Children are emptied and removed before their parent is deleted. Any
/// failure stops the walk; nothing already deleted is restored.
pub async fn delete_subtree<N>(ns: &N, root: &str, max_depth: usize) -> Result<usize, DeleteError>
where
    N: Namespace + ?Sized,
{
    // (path, depth below root, children already scheduled)
    let mut stack = vec![(root.to_string(), 0usize, false)];
    let mut deleted = 0;

    while let Some((path, depth, expanded)) = stack.pop() {
        if !expanded {
            let (children, _) =
                ns.list_children(&path)
                    .await
                    .map_err(|source| DeleteError::List {
                        path: path.clone(),
                        source,
                    })?;

            if !children.is_empty() {
                if depth >= max_depth {
                    return Err(DeleteError::TooDeep { path, max_depth });
                }
                let child_paths: Vec<String> =
                    children.iter().map(|c| join_path(&path, c)).collect();
                stack.push((path, depth, true));
                stack.extend(child_paths.into_iter().map(|c| (c, depth + 1, false)));
                continue;
            }
        }

        ns.delete(&path, None)
            .await
            .map_err(|source| DeleteError::Delete {
                path: path.clone(),
                source,
            })?;
        debug!("Deleted {}", path);
        deleted += 1;
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryNamespace;

    #[tokio::test]
    async fn test_delete_leaf() {
        let ns = MemoryNamespace::new();
        ns.seed("/leaf", b"x");

        let deleted = delete_subtree(&ns, "/leaf", 10).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(!ns.exists("/leaf"));
    }

    #[tokio::test]
    async fn test_children_before_parent() {
        let ns = MemoryNamespace::new();
        ns.seed("/r/c1/g1", b"");
        ns.seed("/r/c2/g2", b"");
        ns.seed("/keep", b"");

        let deleted = delete_subtree(&ns, "/r", 10).await.unwrap();
        assert_eq!(deleted, 5);

        let order = ns.deleted();
        let pos = |p: &str| order.iter().position(|d| d == p).unwrap();
        assert!(pos("/r/c1/g1") < pos("/r/c1"));
        assert!(pos("/r/c2/g2") < pos("/r/c2"));
        assert!(pos("/r/c1") < pos("/r"));
        assert!(pos("/r/c2") < pos("/r"));
        assert_eq!(order.last().unwrap(), "/r");
        assert_eq!(ns.paths(), vec!["/", "/keep"]);
    }

    #[tokio::test]
    async fn test_missing_root() {
        let ns = MemoryNamespace::new();
        let err = delete_subtree(&ns, "/nope", 10).await.unwrap_err();
        assert!(err.is_missing_root("/nope"));
        assert_eq!(err.path(), "/nope");
    }

    #[tokio::test]
    async fn test_failure_names_path_and_stops() {
        let ns = MemoryNamespace::new();
        ns.seed("/r/a", b"");
        ns.seed("/r/b", b"");
        ns.fail_on("/r/b");

        let err = delete_subtree(&ns, "/r", 10).await.unwrap_err();
        assert_eq!(err.path(), "/r/b");
        assert!(ns.exists("/r"));
    }

    #[tokio::test]
    async fn test_depth_guard() {
        let ns = MemoryNamespace::new();
        ns.seed("/d/1/2/3", b"");

        let err = delete_subtree(&ns, "/d", 2).await.unwrap_err();
        assert!(matches!(err, DeleteError::TooDeep { max_depth: 2, .. }));
    }
}
