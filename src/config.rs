// Runtime configuration from the environment

use crate::session::DEFAULT_SESSION_COOKIE;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub session_cookie: String,
    pub session_ttl_hours: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from("jar-ledger.db"),
            bind_addr: "0.0.0.0:3000".to_string(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            session_ttl_hours: 168,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup("JAR_LEDGER_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("JAR_LEDGER_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(cookie) = lookup("JAR_LEDGER_SESSION_COOKIE") {
            if cookie.trim().is_empty() {
                bail!("JAR_LEDGER_SESSION_COOKIE must not be empty");
            }
            config.session_cookie = cookie;
        }
        if let Some(ttl) = lookup("JAR_LEDGER_SESSION_TTL_HOURS") {
            let hours: i64 = ttl
                .trim()
                .parse()
                .with_context(|| {
                    format!("JAR_LEDGER_SESSION_TTL_HOURS is not a number: {:?}", ttl)
                })?;
            if hours <= 0 {
                bail!("JAR_LEDGER_SESSION_TTL_HOURS must be positive, got {}", hours);
            }
            config.session_ttl_hours = hours;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(from_pairs(&[]).unwrap(), Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("JAR_LEDGER_DB_PATH", "/tmp/jars.db"),
            ("JAR_LEDGER_ADDR", "127.0.0.1:8080"),
            ("JAR_LEDGER_SESSION_COOKIE", "sid"),
            ("JAR_LEDGER_SESSION_TTL_HOURS", "24"),
        ])
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/jars.db"));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.session_cookie, "sid");
        assert_eq!(config.session_ttl_hours, 24);
    }

    #[test]
    fn test_bad_values() {
        assert!(from_pairs(&[("JAR_LEDGER_SESSION_TTL_HOURS", "soon")]).is_err());
        assert!(from_pairs(&[("JAR_LEDGER_SESSION_TTL_HOURS", "0")]).is_err());
        assert!(from_pairs(&[("JAR_LEDGER_SESSION_COOKIE", " ")]).is_err());
    }
}
