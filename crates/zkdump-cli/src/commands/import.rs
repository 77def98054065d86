//! Import command handler

use std::path::PathBuf;

use anyhow::{bail, Result};

use zkdump_core::tree::SyncError;
use zkdump_core::{ConflictPolicy, Config, ImportOptions, TreeSynchronizer};

use super::{connect, read_dump, validate_path};
use crate::output::Output;
use crate::progress::ImportBar;

/// Arguments of `zkdump import`
pub struct ImportArgs {
    pub file: PathBuf,
    pub prefix: String,
    pub overwrite: bool,
    pub clear: bool,
}

impl ImportArgs {
    /// Check the arguments and turn them into core options
    pub fn options(&self, config: &Config) -> Result<ImportOptions> {
        validate_path(&self.prefix)?;
        if self.clear && self.prefix == "/" {
            bail!("Refusing to clear the root of the namespace; pick a narrower --prefix");
        }

        let policy = if self.overwrite {
            ConflictPolicy::Overwrite
        } else {
            ConflictPolicy::Skip
        };
        Ok(ImportOptions::new(self.prefix.as_str())
            .with_policy(policy)
            .with_pre_clear(self.clear)
            .with_max_depth(config.max_depth))
    }
}

/// Restore a dump file under a prefix
pub async fn run(config: &Config, args: ImportArgs, output: &Output) -> Result<()> {
    let options = args.options(config)?;
    let db = read_dump(config, &args.file)?;

    let (ns, watcher) = connect(config).await?;

    let bar = ImportBar::new(db.nodes().len() as u64, output.shows_progress());
    let result = TreeSynchronizer::new(&ns, options).run(&db, &bar).await;

    // The watcher must be gone before the session is released
    watcher.stop().await;
    drop(ns);

    let report = match result {
        Ok(report) => report,
        Err(e @ SyncError::PreClear { .. }) => {
            bar.finish("Import aborted");
            return Err(e.into());
        }
    };
    bar.finish("Import completed");

    output.print_report(&report)
}
