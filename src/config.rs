//! Configuration Module
//!
//! Loads server and search settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_TTL_MS;
use crate::search::history::DEFAULT_HISTORY_CAP;
use crate::search::SearchOptions;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in milliseconds for entries stored without one
    pub default_ttl_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in milliseconds
    pub cleanup_interval_ms: u64,
    /// Search history entries kept
    pub history_cap: usize,
    /// Upper bound on one backing fetch, in milliseconds
    pub fetch_timeout_ms: u64,
    /// Width of one trending window, in seconds
    pub trending_window_secs: u64,
    /// JSON catalog served by the search source; empty catalog when unset
    pub catalog_path: Option<PathBuf>,
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_MS` - Default TTL (default: 300000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL_MS` - Sweep frequency (default: 60000)
    /// - `HISTORY_CAP` - Search history size (default: 10)
    /// - `FETCH_TIMEOUT_MS` - Backing fetch timeout (default: 5000)
    /// - `TRENDING_WINDOW_SECS` - Trending window width (default: 3600)
    /// - `CATALOG_PATH` - Search catalog JSON file (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl_ms: parse_var("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            cleanup_interval_ms: parse_var("CLEANUP_INTERVAL_MS", defaults.cleanup_interval_ms),
            history_cap: parse_var("HISTORY_CAP", defaults.history_cap),
            fetch_timeout_ms: parse_var("FETCH_TIMEOUT_MS", defaults.fetch_timeout_ms),
            trending_window_secs: parse_var("TRENDING_WINDOW_SECS", defaults.trending_window_secs),
            catalog_path: env::var("CATALOG_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Search settings derived from this configuration.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
            history_cap: self.history_cap,
            trending_window: Duration::from_secs(self.trending_window_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: DEFAULT_TTL_MS,
            server_port: 3000,
            cleanup_interval_ms: 60_000,
            history_cap: DEFAULT_HISTORY_CAP,
            fetch_timeout_ms: 5_000,
            trending_window_secs: 3_600,
            catalog_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval_ms, 60_000);
        assert_eq!(config.history_cap, 10);
        assert_eq!(config.fetch_timeout_ms, 5_000);
        assert_eq!(config.trending_window_secs, 3_600);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "DEFAULT_TTL_MS",
            "SERVER_PORT",
            "CLEANUP_INTERVAL_MS",
            "HISTORY_CAP",
            "FETCH_TIMEOUT_MS",
            "TRENDING_WINDOW_SECS",
            "CATALOG_PATH",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.default_ttl(), Duration::from_secs(300));
        assert_eq!(config.server_port, 3000);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_search_options() {
        let config = Config {
            fetch_timeout_ms: 250,
            history_cap: 3,
            ..Config::default()
        };
        let options = config.search_options();
        assert_eq!(options.fetch_timeout, Duration::from_millis(250));
        assert_eq!(options.history_cap, 3);
        assert_eq!(options.trending_window, Duration::from_secs(3600));
    }
}
