//! Configuration for the ISS tracker binary.
//!
//! All configuration is loaded from environment variables. The service
//! needs to know where to listen, where the dataset comes from, and
//! which cache to use.

use std::path::PathBuf;
use std::time::Duration;

use iss_core::DEFAULT_ORIGIN_URL;

use crate::server::ServerConfig;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is present but its value cannot be used.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// The environment variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Where the raw dataset is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginSource {
    /// Fetched over HTTP from this URL.
    Url(String),
    /// Read once from a local file.
    File(PathBuf),
}

/// Complete service configuration loaded from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Listen address.
    pub server: ServerConfig,
    /// Dataset origin.
    pub origin: OriginSource,
    /// Deadline for one origin fetch.
    pub origin_timeout: Duration,
    /// Redis connection URL; `None` selects the in-process cache.
    pub redis_url: Option<String>,
    /// Whether to load the dataset before accepting requests.
    pub eager_load: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `ISS_HOST` -- bind address (default `0.0.0.0`)
    /// - `ISS_PORT` -- listen port (default `5000`)
    /// - `ISS_ORIGIN_URL` -- dataset URL (default: NASA's public OEM file)
    /// - `ISS_ORIGIN_FILE` -- read the dataset from this file instead of the URL
    /// - `ISS_ORIGIN_TIMEOUT_MS` -- origin fetch deadline in milliseconds (default 30000)
    /// - `REDIS_URL` -- Redis connection string (default: in-process cache)
    /// - `ISS_EAGER_LOAD` -- load the dataset at startup (default `true`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric or boolean variable
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = ServerConfig::default();

        let host = var("ISS_HOST").unwrap_or(defaults.host);
        let port = parse_or("ISS_PORT", var("ISS_PORT"), defaults.port)?;

        let origin = var("ISS_ORIGIN_FILE").map_or_else(
            || {
                OriginSource::Url(
                    var("ISS_ORIGIN_URL").unwrap_or_else(|| DEFAULT_ORIGIN_URL.to_owned()),
                )
            },
            |path| OriginSource::File(PathBuf::from(path)),
        );

        let origin_timeout_ms: u64 =
            parse_or("ISS_ORIGIN_TIMEOUT_MS", var("ISS_ORIGIN_TIMEOUT_MS"), 30_000)?;
        let eager_load = parse_or("ISS_EAGER_LOAD", var("ISS_EAGER_LOAD"), true)?;

        Ok(Self {
            server: ServerConfig { host, port },
            origin,
            origin_timeout: Duration::from_millis(origin_timeout_ms),
            redis_url: var("REDIS_URL"),
            eager_load,
        })
    }
}

fn parse_or<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |text| {
        text.trim().parse().map_err(|e| ConfigError::Invalid {
            name,
            reason: format!("{text:?}: {e}"),
        })
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.origin, OriginSource::Url(DEFAULT_ORIGIN_URL.to_owned()));
        assert_eq!(config.origin_timeout, Duration::from_secs(30));
        assert_eq!(config.redis_url, None);
        assert!(config.eager_load);
    }

    #[test]
    fn file_origin_overrides_url() {
        let config = config_from(&[
            ("ISS_ORIGIN_URL", "http://mirror.local/oem.xml"),
            ("ISS_ORIGIN_FILE", "/data/oem.xml"),
        ])
        .unwrap();
        assert_eq!(config.origin, OriginSource::File(PathBuf::from("/data/oem.xml")));
    }

    #[test]
    fn explicit_values_are_used() {
        let config = config_from(&[
            ("ISS_HOST", "127.0.0.1"),
            ("ISS_PORT", "8080"),
            ("ISS_ORIGIN_URL", "http://mirror.local/oem.xml"),
            ("ISS_ORIGIN_TIMEOUT_MS", "1500"),
            ("REDIS_URL", "redis://cache:6379"),
            ("ISS_EAGER_LOAD", "false"),
        ])
        .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.origin,
            OriginSource::Url("http://mirror.local/oem.xml".to_owned())
        );
        assert_eq!(config.origin_timeout, Duration::from_millis(1500));
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert!(!config.eager_load);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = config_from(&[("REDIS_URL", ""), ("ISS_PORT", "  ")]).unwrap();
        assert_eq!(config.redis_url, None);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        for (name, value) in [
            ("ISS_PORT", "70000"),
            ("ISS_PORT", "http"),
            ("ISS_ORIGIN_TIMEOUT_MS", "-5"),
            ("ISS_EAGER_LOAD", "yes"),
        ] {
            let err = config_from(&[(name, value)]).unwrap_err();
            assert!(err.to_string().contains(name), "{err}");
        }
    }
}
