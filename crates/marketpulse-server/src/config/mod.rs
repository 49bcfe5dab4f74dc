// SPDX-License-Identifier: Apache-2.0

use marketpulse_api::params::{DEFAULT_COMPANY_LIMIT, DEFAULT_INDEX_LIMIT};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_DB_PATH: &str = "/tmp/marketpulse.db";
pub const DEFAULT_ASSETS_DIR: &str = "assets";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub assets_dir: PathBuf,
    pub rebuild: bool,
    pub max_connections: usize,
    pub default_company_limit: usize,
    pub default_index_limit: usize,
    pub request_timeout: Duration,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            rebuild: false,
            max_connections: 16,
            default_company_limit: DEFAULT_COMPANY_LIMIT,
            default_index_limit: DEFAULT_INDEX_LIMIT,
            request_timeout: Duration::from_millis(5000),
            log_json: true,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Unset or unparsable variables keep their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let db_path = lookup("MARKETPULSE_DB_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| lookup("DATABASE_URL").and_then(|url| sqlite_url_path(&url)))
            .unwrap_or(d.db_path);
        Self {
            bind_addr: lookup("MARKETPULSE_BIND")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(d.bind_addr),
            db_path,
            assets_dir: lookup("MARKETPULSE_ASSETS_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(d.assets_dir),
            rebuild: env_bool(&lookup, "MARKETPULSE_REBUILD", d.rebuild),
            max_connections: env_usize(&lookup, "MARKETPULSE_MAX_CONNECTIONS", d.max_connections)
                .max(1),
            default_company_limit: env_usize(
                &lookup,
                "MARKETPULSE_DEFAULT_COMPANY_LIMIT",
                d.default_company_limit,
            ),
            default_index_limit: env_usize(
                &lookup,
                "MARKETPULSE_DEFAULT_INDEX_LIMIT",
                d.default_index_limit,
            ),
            request_timeout: Duration::from_millis(env_u64(
                &lookup,
                "MARKETPULSE_REQUEST_TIMEOUT_MS",
                d.request_timeout.as_millis() as u64,
            )),
            log_json: env_bool(&lookup, "MARKETPULSE_LOG_JSON", d.log_json),
        }
    }
}

/// `sqlite:///relative.db` and `sqlite:////abs/path.db`.
#[must_use]
pub fn sqlite_url_path(url: &str) -> Option<PathBuf> {
    url.trim()
        .strip_prefix("sqlite:///")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

fn env_bool(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: bool) -> bool {
    lookup(name)
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: u64) -> u64 {
    lookup(name)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: usize) -> usize {
    lookup(name)
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        assert_eq!(config(&[]), ServerConfig::default());
        assert_eq!(config(&[]).db_path, PathBuf::from("/tmp/marketpulse.db"));
    }

    #[test]
    fn database_url_is_a_fallback_for_the_db_path() {
        let c = config(&[("DATABASE_URL", "sqlite:////var/lib/mp.db")]);
        assert_eq!(c.db_path, PathBuf::from("/var/lib/mp.db"));
        let c = config(&[
            ("DATABASE_URL", "sqlite:////var/lib/mp.db"),
            ("MARKETPULSE_DB_PATH", "/data/x.db"),
        ]);
        assert_eq!(c.db_path, PathBuf::from("/data/x.db"));
        assert_eq!(sqlite_url_path("sqlite:///rel.db"), Some(PathBuf::from("rel.db")));
        assert_eq!(sqlite_url_path("postgres://x"), None);
    }

    #[test]
    fn unparsable_values_keep_defaults() {
        let c = config(&[
            ("MARKETPULSE_REBUILD", "yes"),
            ("MARKETPULSE_MAX_CONNECTIONS", "0"),
            ("MARKETPULSE_DEFAULT_INDEX_LIMIT", "lots"),
            ("MARKETPULSE_REQUEST_TIMEOUT_MS", "250"),
            ("MARKETPULSE_LOG_JSON", "false"),
        ]);
        assert!(c.rebuild);
        assert_eq!(c.max_connections, 1);
        assert_eq!(c.default_index_limit, 100);
        assert_eq!(c.request_timeout, Duration::from_millis(250));
        assert!(!c.log_json);
    }
}
