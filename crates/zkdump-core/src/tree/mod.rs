//! Tree operations against a live namespace
//!
//! - `delete`: recursive subtree removal, children before parents
//! - `sync`: replaying a decoded snapshot under a prefix
//! - `walk`: pre-order traversal and size aggregation
//!
//! Traversals use an explicit stack with a depth limit instead of
//! recursion, so a very deep remote tree fails cleanly.

mod delete;
mod sync;
mod walk;

pub use delete::{delete_subtree, DeleteError};
pub use sync::{
    ConflictPolicy, ImportOptions, ImportProgress, NoProgress, NodeOutcome, NodeReport,
    SyncError, SyncReport, TreeSynchronizer, DEFAULT_MAX_DEPTH,
};
pub use walk::{disk_usage, walk, DiskUsage, WalkError};
