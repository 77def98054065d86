//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/zkdump/config.toml)
//! 3. Environment variables (ZKDUMP_* prefix)
//!
//! Environment variables take precedence over config file values.
//! Command-line flags are applied on top by the CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::decoder::{parse_offset, SnapshotDecoder};
use crate::tree::DEFAULT_MAX_DEPTH;

/// Environment variable prefix
const ENV_PREFIX: &str = "ZKDUMP";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// ZooKeeper servers as `host:port`
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    /// Session timeout in milliseconds
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    /// UTC offset for dump timestamps with an unrecognized zone, e.g. `+08:00`
    #[serde(default)]
    pub dump_utc_offset: Option<String>,

    /// Depth limit for tree traversals
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            session_timeout_ms: default_session_timeout_ms(),
            dump_utc_offset: None,
            max_depth: default_max_depth(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (ZKDUMP_HOSTS, ZKDUMP_SESSION_TIMEOUT_MS, ...)
    /// 2. Config file (~/.config/zkdump/config.toml or ZKDUMP_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // ZKDUMP_HOSTS
        if let Ok(val) = std::env::var(format!("{}_HOSTS", ENV_PREFIX)) {
            self.hosts = split_hosts(&val);
        }

        // ZKDUMP_SESSION_TIMEOUT_MS
        if let Ok(val) = std::env::var(format!("{}_SESSION_TIMEOUT_MS", ENV_PREFIX)) {
            self.session_timeout_ms = val
                .parse()
                .with_context(|| format!("Invalid {}_SESSION_TIMEOUT_MS: {}", ENV_PREFIX, val))?;
        }

        // ZKDUMP_DUMP_UTC_OFFSET
        if let Ok(val) = std::env::var(format!("{}_DUMP_UTC_OFFSET", ENV_PREFIX)) {
            self.dump_utc_offset = if val.is_empty() { None } else { Some(val) };
        }

        // ZKDUMP_MAX_DEPTH
        if let Ok(val) = std::env::var(format!("{}_MAX_DEPTH", ENV_PREFIX)) {
            self.max_depth = val
                .parse()
                .with_context(|| format!("Invalid {}_MAX_DEPTH: {}", ENV_PREFIX, val))?;
        }

        Ok(())
    }

    /// Reject values that would only fail later
    fn validate(&self) -> Result<()> {
        if self.session_timeout_ms == 0 {
            return Err(anyhow!("session_timeout_ms must be greater than zero"));
        }
        if self.max_depth == 0 {
            return Err(anyhow!("max_depth must be greater than zero"));
        }
        self.zone_offset()?;
        Ok(())
    }

    /// Session timeout as a duration
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    /// Parsed `dump_utc_offset`, `None` when unset
    pub fn zone_offset(&self) -> Result<Option<FixedOffset>> {
        self.dump_utc_offset
            .as_deref()
            .map(|s| parse_offset(s).ok_or_else(|| anyhow!("Invalid dump_utc_offset: '{}'", s)))
            .transpose()
    }

    /// Decoder set up for this configuration
    pub fn decoder(&self) -> Result<SnapshotDecoder> {
        let decoder = SnapshotDecoder::new();
        Ok(match self.zone_offset()? {
            Some(offset) => decoder.with_zone_offset(offset),
            None => decoder,
        })
    }

    /// Get the config file path
    ///
    /// Can be overridden with ZKDUMP_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zkdump")
            .join("config.toml")
    }
}

/// Split a comma separated host list
pub fn split_hosts(hosts: &str) -> Vec<String> {
    hosts
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect()
}

fn default_hosts() -> Vec<String> {
    vec!["127.0.0.1:2181".to_string()]
}

fn default_session_timeout_ms() -> u64 {
    10_000
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "ZKDUMP_HOSTS",
        "ZKDUMP_SESSION_TIMEOUT_MS",
        "ZKDUMP_DUMP_UTC_OFFSET",
        "ZKDUMP_MAX_DEPTH",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hosts, vec!["127.0.0.1:2181"]);
        assert_eq!(config.session_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.dump_utc_offset.is_none());
    }

    #[test]
    fn test_split_hosts() {
        assert_eq!(
            split_hosts("zk1:2181, zk2:2181,,zk3:2181"),
            vec!["zk1:2181", "zk2:2181", "zk3:2181"]
        );
        assert!(split_hosts("").is_empty());
    }

    #[test]
    fn test_env_override_hosts() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("ZKDUMP_HOSTS", "a:1,b:2");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.hosts, vec!["a:1", "b:2"]);
    }

    #[test]
    fn test_env_override_timeout() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("ZKDUMP_SESSION_TIMEOUT_MS", "2500");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.session_timeout(), Duration::from_millis(2500));

        env::set_var("ZKDUMP_SESSION_TIMEOUT_MS", "soon");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_env_override_offset() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("ZKDUMP_DUMP_UTC_OFFSET", "+08:00");
        config.apply_env_overrides().unwrap();
        assert_eq!(
            config.zone_offset().unwrap().unwrap().local_minus_utc(),
            8 * 3600
        );

        // Empty string clears it
        env::set_var("ZKDUMP_DUMP_UTC_OFFSET", "");
        config.apply_env_overrides().unwrap();
        assert!(config.zone_offset().unwrap().is_none());
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            hosts = ["zk1:2181", "zk2:2181"]
            session_timeout_ms = 30000
            dump_utc_offset = "-05:00"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.hosts, vec!["zk1:2181", "zk2:2181"]);
        assert_eq!(config.session_timeout_ms, 30000);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.decoder().is_ok());
    }

    #[test]
    fn test_invalid_offset_rejected() {
        let _guard = EnvGuard::new(ENV_VARS);

        let err = Config::load_from_str(r#"dump_utc_offset = "CST""#).unwrap_err();
        assert!(err.to_string().contains("dump_utc_offset"));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let _guard = EnvGuard::new(ENV_VARS);

        assert!(Config::load_from_str("max_depth = 0").is_err());
    }

    #[test]
    fn test_load_from_path() {
        let _guard = EnvGuard::new(ENV_VARS);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "hosts = [\"zk9:2181\"]\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.hosts, vec!["zk9:2181"]);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            hosts: vec!["zk:2181".to_string()],
            session_timeout_ms: 5000,
            dump_utc_offset: Some("+01:00".to_string()),
            max_depth: 64,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("hosts"));
        assert!(toml_str.contains("session_timeout_ms"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }
}
