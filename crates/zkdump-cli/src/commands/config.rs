//! Config command handlers

use anyhow::Result;

use zkdump_core::Config;

use crate::output::{Output, OutputFormat};

/// Show the effective configuration
pub fn show(config: &Config, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "hosts": config.hosts,
                    "session_timeout_ms": config.session_timeout_ms,
                    "dump_utc_offset": config.dump_utc_offset,
                    "max_depth": config.max_depth
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.hosts.join(","));
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  hosts:              {}", config.hosts.join(","));
            println!("  session_timeout_ms: {}", config.session_timeout_ms);
            println!(
                "  dump_utc_offset:    {}",
                config.dump_utc_offset.as_deref().unwrap_or("(not set)")
            );
            println!("  max_depth:          {}", config.max_depth);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}
