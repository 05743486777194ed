//! Configuration module for the offline mirror.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_VERSION_URL: &str =
    "https://api.github.com/repos/manami-project/anime-offline-database/commits/master";
const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/manami-project/anime-offline-database/master/anime-offline-database.zip";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint returning a JSON object that carries the remote version token
    pub version_url: String,
    /// Name of the token field in the version-check response
    pub version_field: String,
    /// Endpoint serving the zipped dataset
    pub dataset_url: String,
    /// Bound for the version-check request
    pub version_timeout: Duration,
    /// Bound for the archive download
    pub archive_timeout: Duration,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address the interceptor proxy binds to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Items requested per result page
    pub page_size: usize,
    /// URLs fetched into the interceptor cache at startup
    pub precache_urls: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let version_url =
            env::var("AOD_VERSION_URL").unwrap_or_else(|_| DEFAULT_VERSION_URL.to_string());

        let version_field = env::var("AOD_VERSION_FIELD").unwrap_or_else(|_| "sha".to_string());

        let dataset_url =
            env::var("AOD_DATASET_URL").unwrap_or_else(|_| DEFAULT_DATASET_URL.to_string());

        let version_timeout = Duration::from_secs(env_number("AOD_VERSION_TIMEOUT_SECS", 8));
        let archive_timeout = Duration::from_secs(env_number("AOD_ARCHIVE_TIMEOUT_SECS", 3600));

        let db_path = env::var("AOD_DB_PATH")
            .unwrap_or_else(|_| "./data/offline.sqlite".to_string())
            .into();

        let bind_addr = env::var("AOD_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8082".to_string())
            .parse()
            .expect("Invalid AOD_BIND_ADDR format");

        let log_level = env::var("AOD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let page_size = env_number("AOD_PAGE_SIZE", 20).max(1) as usize;

        let precache_urls = env::var("AOD_PRECACHE_URLS")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        Self {
            version_url,
            version_field,
            dataset_url,
            version_timeout,
            archive_timeout,
            db_path,
            bind_addr,
            log_level,
            page_size,
            precache_urls,
        }
    }
}

/// Read a numeric variable, falling back to `default` when unset or unparsable.
fn env_number(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        for name in [
            "AOD_VERSION_URL",
            "AOD_VERSION_FIELD",
            "AOD_DATASET_URL",
            "AOD_VERSION_TIMEOUT_SECS",
            "AOD_ARCHIVE_TIMEOUT_SECS",
            "AOD_DB_PATH",
            "AOD_BIND_ADDR",
            "AOD_LOG_LEVEL",
            "AOD_PAGE_SIZE",
            "AOD_PRECACHE_URLS",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();

        assert_eq!(config.version_url, DEFAULT_VERSION_URL);
        assert_eq!(config.version_field, "sha");
        assert_eq!(config.dataset_url, DEFAULT_DATASET_URL);
        assert_eq!(config.version_timeout, Duration::from_secs(8));
        assert_eq!(config.archive_timeout, Duration::from_secs(3600));
        assert_eq!(config.db_path, PathBuf::from("./data/offline.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8082");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.page_size, 20);
        assert!(config.precache_urls.is_empty());
    }

    #[test]
    fn test_split_list_skips_blanks() {
        assert_eq!(
            split_list(" /a.js, ,/b.css,"),
            vec!["/a.js".to_string(), "/b.css".to_string()]
        );
        assert!(split_list("").is_empty());
    }
}
