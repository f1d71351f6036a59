//! Process configuration read from the environment
//!
//! `.env` files are honoured through `dotenvy` in `main`. Every setting has a
//! default, so an empty environment yields a working local setup:
//!
//! - `PORT` - listening port (default: 8000)
//! - `DATABASE_URL` - redb file path (default: "data.db")
//! - `STORE_BACKEND` - `document` or `key_value` (default: document)
//! - `TEMPLATE_DIR` - directory holding `index.html` and `song.html` (default: "./static")
//! - `REDIRECT_BASE` - prefix of every outbound redirect
//! - `COUNTER_TIMEOUT_MS` - bound on each background click increment (default: 5000)
//! - `SEED_FILE` - optional JSON file of records inserted at startup

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::StartupError;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_REDIRECT_BASE: &str = "https://open.spotify.com/intl-de/track/";
pub const DEFAULT_COUNTER_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_LOG_FILTER: &str = "songlink=debug,tower_http=debug";

/// Which [`RecordStore`](crate::store::RecordStore) backend serves requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Full records with metadata and click counters
    #[default]
    Document,
    /// Bare identifier to external reference mapping
    KeyValue,
}

impl FromStr for BackendKind {
    type Err = StartupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" | "doc" => Ok(BackendKind::Document),
            "key_value" | "key-value" | "kv" => Ok(BackendKind::KeyValue),
            other => Err(StartupError::Config(format!("unknown STORE_BACKEND `{}`", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub backend: BackendKind,
    pub template_dir: PathBuf,
    pub redirect_base: String,
    pub counter_timeout: Duration,
    pub seed_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: "data.db".to_string(),
            backend: BackendKind::default(),
            template_dir: PathBuf::from("./static"),
            redirect_base: DEFAULT_REDIRECT_BASE.to_string(),
            counter_timeout: DEFAULT_COUNTER_TIMEOUT,
            seed_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StartupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Config::default();

        if let Some(port) = get("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| StartupError::Config(format!("PORT `{}` is not a valid port", port)))?;
        }
        if let Some(path) = get("DATABASE_URL") {
            config.database_url = path;
        }
        if let Some(backend) = get("STORE_BACKEND") {
            config.backend = backend.parse()?;
        }
        if let Some(dir) = get("TEMPLATE_DIR") {
            config.template_dir = PathBuf::from(dir);
        }
        if let Some(base) = get("REDIRECT_BASE") {
            config.redirect_base = base;
        }
        if let Some(ms) = get("COUNTER_TIMEOUT_MS") {
            let ms: u64 = ms.trim().parse().map_err(|_| {
                StartupError::Config(format!("COUNTER_TIMEOUT_MS `{}` is not a number", ms))
            })?;
            config.counter_timeout = Duration::from_millis(ms);
        }
        config.seed_file = get("SEED_FILE").map(PathBuf::from);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, StartupError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = from_pairs(&[]).unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.database_url, "data.db");
        assert_eq!(config.backend, BackendKind::Document);
        assert_eq!(config.redirect_base, "https://open.spotify.com/intl-de/track/");
        assert_eq!(config.counter_timeout, Duration::from_secs(5));
        assert!(config.seed_file.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = from_pairs(&[
            ("PORT", "9100"),
            ("DATABASE_URL", "/tmp/links.db"),
            ("STORE_BACKEND", "kv"),
            ("COUNTER_TIMEOUT_MS", "250"),
            ("SEED_FILE", "seed.json"),
        ])
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.database_url, "/tmp/links.db");
        assert_eq!(config.backend, BackendKind::KeyValue);
        assert_eq!(config.counter_timeout, Duration::from_millis(250));
        assert_eq!(config.seed_file, Some(PathBuf::from("seed.json")));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = from_pairs(&[("PORT", " "), ("SEED_FILE", "")]).unwrap();

        assert_eq!(config.port, 8000);
        assert!(config.seed_file.is_none());
    }

    #[test]
    fn malformed_values_are_fatal() {
        assert!(matches!(from_pairs(&[("PORT", "eighty")]), Err(StartupError::Config(_))));
        assert!(matches!(from_pairs(&[("STORE_BACKEND", "mongo")]), Err(StartupError::Config(_))));
        assert!(matches!(
            from_pairs(&[("COUNTER_TIMEOUT_MS", "-1")]),
            Err(StartupError::Config(_))
        ));
    }
}
