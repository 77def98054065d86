//! zkdump Core Library
//!
//! This crate restores and inspects ZooKeeper trees using the text dumps
//! written by ZooKeeper's snapshot formatter.
//!
//! # Architecture
//!
//! - **Decoder**: dump text → [`SnapshotDatabase`], all or nothing
//! - **Tree**: replays a database into a [`Namespace`], deletes and walks subtrees
//! - **Remote**: the [`Namespace`] trait, backed by ZooKeeper or memory
//!
//! # Quick Start
//!
//! ```text
//! let db = SnapshotDecoder::new().decode_reader(BufReader::new(file))?;
//!
//! let (ns, events) = ZkNamespace::connect(&config.hosts, config.session_timeout()).await?;
//! let watcher = EventWatcher::spawn(events);
//!
//! let options = ImportOptions::new("/restore").with_policy(ConflictPolicy::Overwrite);
//! let report = TreeSynchronizer::new(&ns, options).run(&db, &NoProgress).await?;
//!
//! watcher.stop().await;
//! ```
//!
//! # Modules
//!
//! - `models`: Snapshot records and the decoded database
//! - `decoder`: Dump text decoding
//! - `remote`: Namespace trait and implementations
//! - `tree`: Import, subtree deletion, traversal
//! - `watcher`: Connectivity event logging
//! - `config`: Application configuration

pub mod config;
pub mod decoder;
pub mod models;
pub mod remote;
pub mod tree;
pub mod watcher;

pub use config::Config;
pub use decoder::{DecodeError, SnapshotDecoder};
pub use models::{NodeRecord, SessionRecord, SnapshotDatabase, SnapshotSummary};
pub use remote::{MemoryNamespace, Namespace, NamespaceError, NodeStat, ZkNamespace};
pub use tree::{ConflictPolicy, ImportOptions, SyncReport, TreeSynchronizer};
pub use watcher::EventWatcher;
