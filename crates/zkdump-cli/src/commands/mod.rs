//! Command handlers

pub mod config;
pub mod du;
pub mod import;
pub mod inspect;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use zkdump_core::{Config, EventWatcher, SnapshotDatabase, ZkNamespace};

/// Decode a dump file with the configured decoder
pub fn read_dump(config: &Config, file: &Path) -> Result<SnapshotDatabase> {
    if !file.exists() {
        bail!("Dump file {} does not exist", file.display());
    }
    let fh = File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;

    let db = config
        .decoder()?
        .decode_reader(BufReader::new(fh))
        .with_context(|| format!("Failed to parse dump {}", file.display()))?;

    info!(
        "Parse completed: {} znodes, {} sessions",
        db.nodes().len(),
        db.sessions().len()
    );
    Ok(db)
}

/// Connect to ZooKeeper and start logging session events
///
/// Stop the returned watcher before dropping the namespace.
pub async fn connect(config: &Config) -> Result<(ZkNamespace, EventWatcher)> {
    let (ns, events) = ZkNamespace::connect(&config.hosts, config.session_timeout())
        .await
        .context("Connect failed")?;
    let watcher = EventWatcher::spawn(events);
    Ok((ns, watcher))
}

/// Check a destination or walk path given on the command line
pub fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("Path is empty");
    }
    if !path.starts_with('/') {
        bail!("Path '{}' must be absolute", path);
    }
    if path.len() > 1 && path.ends_with('/') {
        bail!("Path '{}' must not end with '/'", path);
    }
    Ok(())
}
