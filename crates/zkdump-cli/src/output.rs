//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use anyhow::Result;
use serde::Serialize;

use zkdump_core::tree::{DiskUsage, SyncReport};
use zkdump_core::SnapshotSummary;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Progress bars only make sense for a person watching
    pub fn shows_progress(&self) -> bool {
        self.format == OutputFormat::Human
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print the outcome of an import
    pub fn print_report(&self, report: &SyncReport) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("Import into {}", report.prefix);
                if report.cleared > 0 {
                    println!("  Cleared:     {}", report.cleared);
                }
                println!("  Created:     {}", report.created());
                println!("  Overwritten: {}", report.overwritten());
                println!("  Skipped:     {}", report.skipped());
                println!("  Failed:      {}", report.failed());

                for failure in report.failures() {
                    println!("  ✗ {}", failure);
                }
                if let Some(ref warning) = report.prefix_warning {
                    println!("  ⚠ {}", warning);
                }
                if let Some(ref warning) = report.barrier_warning {
                    println!("  ⚠ {}", warning);
                }
            }
            OutputFormat::Json => self.print_json(report)?,
            OutputFormat::Quiet => {
                if report.failed() > 0 {
                    println!("{}", report.failed());
                }
            }
        }
        Ok(())
    }

    /// Print the size of a subtree
    pub fn print_usage(&self, path: &str, usage: &DiskUsage) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("{}", path);
                println!("  Nodes:      {}", usage.nodes);
                println!(
                    "  Total size: {} ({} bytes)",
                    human_size(usage.total_bytes),
                    usage.total_bytes
                );
            }
            OutputFormat::Json => self.print_json(&serde_json::json!({
                "path": path,
                "count": usage.nodes,
                "total_size": usage.total_bytes
            }))?,
            OutputFormat::Quiet => println!("{}", usage.total_bytes),
        }
        Ok(())
    }

    /// Print a summary of a decoded dump
    pub fn print_summary(&self, summary: &SnapshotSummary) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("Snapshot");
                println!("  Last zxid:  0x{:x}", summary.last_processed_zxid);
                println!("  Znodes:     {}", summary.node_count);
                println!("  Ephemeral:  {}", summary.ephemeral_count);
                println!("  Sessions:   {}", summary.session_count);
                println!("  Max depth:  {}", summary.max_depth);
                println!(
                    "  Data size:  {} ({} bytes)",
                    human_size(summary.total_data_bytes),
                    summary.total_data_bytes
                );
            }
            OutputFormat::Json => self.print_json(summary)?,
            OutputFormat::Quiet => println!("{}", summary.node_count),
        }
        Ok(())
    }
}

/// Format a byte count with a binary unit
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
