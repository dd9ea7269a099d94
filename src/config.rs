//! Startup configuration.
//!
//! Everything the application needs at boot lives in [`Config`], which is
//! built once in `main` and passed down explicitly. Values come from the
//! process environment; a `.env` file is honoured when present.

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::error::ConfigError;

/// Shortest secret accepted for cookie signing.
pub const MIN_SECRET_LEN: usize = 64;

/// Demo signing secret. Anyone reading this file can forge cookies, so
/// override it with `SESSION_SECRET` outside of local experiments.
pub const DEMO_SECRET: &str =
    "this is a demo secret and must never be used to sign cookies in production!!";

/// Which session backend to run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    /// Volatile, in-process sessions.
    Memory,
    /// One file per session under [`Config::session_dir`].
    File,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub secret: String,
    pub store: StoreKind,
    /// Directory used by the file backend.
    pub session_dir: PathBuf,
    /// Rolling inactivity window after which a session expires.
    pub session_ttl: time::Duration,
    /// How often the file backend sweeps expired sessions.
    pub cleanup_interval: Duration,
    /// Whether the session cookie carries the `Secure` attribute.
    pub secure_cookie: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            secret: DEMO_SECRET.to_string(),
            store: StoreKind::Memory,
            session_dir: PathBuf::from("./sessions"),
            session_ttl: time::Duration::hours(24),
            cleanup_interval: Duration::from_secs(3600),
            secure_cookie: false,
        }
    }
}

impl Config {
    /// Reads the configuration from the environment, loading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// Unset variables fall back to [`Config::default`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parse_var(&lookup, "PORT")?.unwrap_or(defaults.port);
        let secret = lookup("SESSION_SECRET").unwrap_or(defaults.secret);
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                len: secret.len(),
                min: MIN_SECRET_LEN,
            });
        }

        let session_dir = lookup("SESSION_DIR").map_or(defaults.session_dir, PathBuf::from);
        let store = match lookup("SESSION_STORE").as_deref() {
            None | Some("memory") => StoreKind::Memory,
            Some("file") => StoreKind::File,
            Some(other) => return Err(ConfigError::UnknownStore(other.to_string())),
        };

        let session_ttl = parse_var::<i64, _>(&lookup, "SESSION_TTL_SECS")?
            .map_or(defaults.session_ttl, time::Duration::seconds);
        let cleanup_interval = parse_var(&lookup, "SESSION_CLEANUP_INTERVAL_SECS")?
            .map_or(defaults.cleanup_interval, Duration::from_secs);
        if session_ttl <= time::Duration::ZERO {
            return Err(ConfigError::Invalid {
                name: "SESSION_TTL_SECS",
                value: session_ttl.whole_seconds().to_string(),
            });
        }
        if cleanup_interval.is_zero() {
            return Err(ConfigError::Invalid {
                name: "SESSION_CLEANUP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }
        let secure_cookie = parse_var(&lookup, "SESSION_SECURE")?.unwrap_or(defaults.secure_cookie);

        Ok(Self {
            port,
            secret,
            store,
            session_dir,
            session_ttl,
            cleanup_interval,
            secure_cookie,
        })
    }

    /// Switches to the in-memory backend.
    pub fn with_memory_store(mut self) -> Self {
        self.store = StoreKind::Memory;
        self
    }

    /// Switches to the file backend rooted at [`Config::session_dir`].
    pub fn with_file_store(mut self) -> Self {
        self.store = StoreKind::File;
        self
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.secret, DEMO_SECRET);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.session_dir, PathBuf::from("./sessions"));
        assert_eq!(config.session_ttl, time::Duration::hours(24));
        assert_eq!(config.cleanup_interval, Duration::from_secs(3600));
        assert!(!config.secure_cookie);
    }

    #[test]
    fn demo_secret_is_long_enough() {
        assert!(DEMO_SECRET.len() >= MIN_SECRET_LEN);
    }

    #[test]
    fn reads_file_store_settings() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("SESSION_STORE", "file"),
            ("SESSION_DIR", "/tmp/demo-sessions"),
            ("SESSION_TTL_SECS", "60"),
            ("SESSION_CLEANUP_INTERVAL_SECS", "5"),
            ("SESSION_SECURE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreKind::File);
        assert_eq!(config.session_dir, PathBuf::from("/tmp/demo-sessions"));
        assert_eq!(config.session_ttl, time::Duration::seconds(60));
        assert_eq!(config.cleanup_interval, Duration::from_secs(5));
        assert!(config.secure_cookie);
    }

    #[test]
    fn rejects_short_secret() {
        let err = Config::from_lookup(lookup(&[("SESSION_SECRET", "demo 2")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::SecretTooShort { len: 6, min: MIN_SECRET_LEN }
        ));
    }

    #[test]
    fn rejects_unknown_store() {
        let err = Config::from_lookup(lookup(&[("SESSION_STORE", "redis")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStore(s) if s == "redis"));
    }

    #[test]
    fn rejects_zero_durations() {
        let err = Config::from_lookup(lookup(&[("SESSION_TTL_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "SESSION_TTL_SECS", .. }));

        let err =
            Config::from_lookup(lookup(&[("SESSION_CLEANUP_INTERVAL_SECS", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { name: "SESSION_CLEANUP_INTERVAL_SECS", .. }
        ));
    }

    #[test]
    fn rejects_bad_port() {
        let err = Config::from_lookup(lookup(&[("PORT", "three thousand")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }
}
