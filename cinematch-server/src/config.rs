use std::{env, path::PathBuf, str::FromStr, time::Duration};

use axum::http::HeaderValue;
use cinematch_collab::Config;
use thiserror::Error;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 8000;
/// The web client's development server
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the process reads from its environment on startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Origins allowed to make credentialed requests
    pub allowed_origins: Vec<HeaderValue>,
    /// A JSON file to load the movie list from instead of the built-in one
    pub catalog_path: Option<PathBuf>,
    pub collab: Config,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origins: vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN)],
            catalog_path: None,
            collab: Config::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from `CINEMATCH_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = parse_var(&lookup, "CINEMATCH_PORT")? {
            config.port = port;
        }

        if let Some(origins) = lookup("CINEMATCH_ALLOWED_ORIGINS") {
            config.allowed_origins = parse_origins(&origins)?;
        }

        config.catalog_path = lookup("CINEMATCH_CATALOG")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        if let Some(capacity) = parse_var::<usize>(&lookup, "CINEMATCH_ROOM_CAPACITY")? {
            if capacity == 0 {
                return Err(invalid("CINEMATCH_ROOM_CAPACITY", capacity, "must be at least 1"));
            }

            config.collab.room_capacity = capacity;
        }

        if let Some(quorum) = parse_var(&lookup, "CINEMATCH_MATCH_QUORUM")? {
            config.collab.match_quorum = quorum;
        }

        let (quorum, capacity) = (config.collab.match_quorum, config.collab.room_capacity);
        if quorum == 0 || quorum > capacity {
            return Err(invalid(
                "CINEMATCH_MATCH_QUORUM",
                quorum,
                format!("must be between 1 and the room capacity ({capacity})"),
            ));
        }

        if let Some(secs) = parse_var(&lookup, "CINEMATCH_ROOM_TTL_SECS")? {
            config.collab.room_ttl = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<u64>(&lookup, "CINEMATCH_SWEEP_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(invalid("CINEMATCH_SWEEP_INTERVAL_SECS", secs, "must be at least 1"));
            }

            config.collab.sweep_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    lookup(name)
        .map(|value| value.trim().parse().map_err(|e: T::Err| invalid(name, &value, e.to_string())))
        .transpose()
}

fn parse_origins(value: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    let origins = value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|origin| {
            if origin == "*" {
                return Err(invalid(
                    "CINEMATCH_ALLOWED_ORIGINS",
                    origin,
                    "credentialed requests need explicit origins",
                ));
            }

            HeaderValue::from_str(origin)
                .map_err(|e| invalid("CINEMATCH_ALLOWED_ORIGINS", origin, e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if origins.is_empty() {
        return Err(invalid("CINEMATCH_ALLOWED_ORIGINS", value, "no origins given"));
    }

    Ok(origins)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.allowed_origins, vec![DEFAULT_ALLOWED_ORIGIN]);
        assert_eq!(config.collab.room_capacity, 2);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CINEMATCH_PORT", "9000"),
            ("CINEMATCH_ALLOWED_ORIGINS", "http://a.test, http://b.test"),
            ("CINEMATCH_ROOM_CAPACITY", "4"),
            ("CINEMATCH_ROOM_TTL_SECS", "30"),
            ("CINEMATCH_CATALOG", "movies.json"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.collab.room_capacity, 4);
        assert_eq!(config.collab.room_ttl, Duration::from_secs(30));
        assert_eq!(config.catalog_path, Some(PathBuf::from("movies.json")));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let cases: [&[(&str, &str)]; 6] = [
            &[("CINEMATCH_PORT", "eighty")],
            &[("CINEMATCH_ROOM_CAPACITY", "0")],
            &[("CINEMATCH_SWEEP_INTERVAL_SECS", "0")],
            &[("CINEMATCH_ALLOWED_ORIGINS", "*")],
            &[("CINEMATCH_MATCH_QUORUM", "0")],
            &[("CINEMATCH_MATCH_QUORUM", "3")],
        ];

        for vars in cases {
            assert!(
                matches!(config_from(vars), Err(ConfigError::Invalid { .. })),
                "{vars:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_quorum_is_checked_against_capacity() {
        let config = config_from(&[
            ("CINEMATCH_ROOM_CAPACITY", "4"),
            ("CINEMATCH_MATCH_QUORUM", "3"),
        ])
        .unwrap();

        assert_eq!(config.collab.match_quorum, 3);

        let err = config_from(&[
            ("CINEMATCH_ROOM_CAPACITY", "4"),
            ("CINEMATCH_MATCH_QUORUM", "5"),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "CINEMATCH_MATCH_QUORUM",
                ..
            }
        ));
    }
}
