//! Disk usage command handler

use anyhow::{Context, Result};

use zkdump_core::tree::disk_usage;
use zkdump_core::Config;

use super::{connect, validate_path};
use crate::output::Output;

/// Sum the data size of a live subtree
pub async fn run(config: &Config, path: &str, output: &Output) -> Result<()> {
    validate_path(path)?;

    let (ns, watcher) = connect(config).await?;
    let result = disk_usage(&ns, path, config.max_depth).await;

    watcher.stop().await;
    drop(ns);

    let usage = result.with_context(|| format!("Failed to walk {}", path))?;
    output.print_usage(path, &usage)
}
