//! Layered configuration.
//!
//! Values are merged in order, later sources winning:
//! 1. built-in defaults,
//! 2. an optional configuration file (TOML, YAML or JSON, picked by extension),
//! 3. environment variables prefixed with `MEDIASYNC_`, nested keys separated
//!    by `__` (e.g. `MEDIASYNC_CACHE__MAX_CONNECTIONS=2`).

pub mod error;

use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ErrorKind, Result};

pub const ENV_PREFIX: &str = "MEDIASYNC_";
/// File name of the cache inside the platform cache directory.
pub const CACHE_FILE_NAME: &str = "cache.sqlite3";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache file location. Defaults to [`CACHE_FILE_NAME`] in the platform
    /// cache directory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    /// How long to wait on a lock held by another session, in milliseconds.
    pub busy_timeout_ms: u64,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 5,
            busy_timeout_ms: 1500,
        }
    }
}
impl CacheConfig {
    /// The configured cache path, or the platform default.
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => default_cache_path(),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn default_cache_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "mediasync").ok_or_raise(|| ErrorKind::NoCacheDirectory)?;
    Ok(dirs.cache_dir().join(CACHE_FILE_NAME))
}

impl Config {
    /// Defaults overridden by the environment.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::defaults().merge(Self::env()))
    }

    /// Defaults, then the given file, then the environment.
    ///
    /// A missing file is not an error; figment treats it as an empty source.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Figment::from(Yaml::file(path)),
            Some("json") => Figment::from(Json::file(path)),
            _ => Figment::from(Toml::file(path)),
        };
        tracing::debug!(path = %path.display(), "loading configuration file");
        Self::from_figment(Self::defaults().merge(file).merge(Self::env()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment.extract().or_raise(|| ErrorKind::Load)
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
    }

    fn env() -> Env {
        Env::prefixed(ENV_PREFIX).split("__")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_| {
            let config = Config::load().unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.cache.busy_timeout(), Duration::from_millis(1500));
            Ok(())
        });
    }

    #[rstest]
    #[case("mediasync.toml", "[cache]\npath = \"/tmp/a.sqlite3\"\nmax_connections = 2\n")]
    #[case("mediasync.yaml", "cache:\n  path: /tmp/a.sqlite3\n  max_connections: 2\n")]
    #[case("mediasync.json", r#"{"cache": {"path": "/tmp/a.sqlite3", "max_connections": 2}}"#)]
    fn test_file_formats(#[case] name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(name, contents)?;
            let config = Config::load_from(name).unwrap();
            assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/a.sqlite3")));
            assert_eq!(config.cache.max_connections, 2);
            assert_eq!(config.cache.busy_timeout_ms, 1500);
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("mediasync.toml", "[cache]\nmax_connections = 2\nbusy_timeout_ms = 10\n")?;
            jail.set_env("MEDIASYNC_CACHE__MAX_CONNECTIONS", 8);
            let config = Config::load_from("mediasync.toml").unwrap();
            assert_eq!(config.cache.max_connections, 8);
            assert_eq!(config.cache.busy_timeout_ms, 10);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        Jail::expect_with(|_| {
            assert_eq!(Config::load_from("absent.toml").unwrap(), Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_value_fails_to_load() {
        Jail::expect_with(|jail| {
            jail.set_env("MEDIASYNC_CACHE__MAX_CONNECTIONS", "many");
            assert_eq!(*Config::load().unwrap_err(), ErrorKind::Load);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_path_wins() {
        let config = CacheConfig {
            path: Some(PathBuf::from("/srv/mediasync/cache.sqlite3")),
            ..CacheConfig::default()
        };
        assert_eq!(config.resolve_path().unwrap(), PathBuf::from("/srv/mediasync/cache.sqlite3"));
    }

    #[test]
    fn test_default_path_is_in_cache_directory() {
        // Platforms without a home directory have no default.
        if let Ok(path) = CacheConfig::default().resolve_path() {
            assert!(path.ends_with(CACHE_FILE_NAME));
        }
    }
}
