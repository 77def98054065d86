//! Inspect command handler

use std::path::Path;

use anyhow::Result;

use zkdump_core::Config;

use super::read_dump;
use crate::output::Output;

/// Decode a dump file and print what it contains
pub fn run(config: &Config, file: &Path, output: &Output) -> Result<()> {
    let db = read_dump(config, file)?;
    output.print_summary(&db.summary())
}
