//! Runtime configuration.
//!
//! Backend selection happens here, once, before the engine is built. All
//! settings come from `DEALFLOW_*` environment variables; anything unset
//! falls back to [`CrmConfig::default`] (bundled demo data, no latency).

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::storage::remote::client::DEFAULT_PAGE_SIZE;
use crate::storage::remote::PageInfo;
use crate::storage::SIMULATED_LATENCY;
use crate::view::RECENT_ACTIVITY_LIMIT;

/// `mock` or `remote`.
pub const ENV_BACKEND: &str = "DEALFLOW_BACKEND";
/// Fixture JSON file for the mock backend.
pub const ENV_FIXTURES: &str = "DEALFLOW_FIXTURES";
/// Per-call mock latency in milliseconds, or `on` for the default delay.
pub const ENV_MOCK_LATENCY_MS: &str = "DEALFLOW_MOCK_LATENCY_MS";
/// Base URL of the record service.
pub const ENV_REMOTE_URL: &str = "DEALFLOW_REMOTE_URL";
/// Project id sent to the record service.
pub const ENV_PROJECT_ID: &str = "DEALFLOW_PROJECT_ID";
/// Public key sent to the record service.
pub const ENV_PUBLIC_KEY: &str = "DEALFLOW_PUBLIC_KEY";
/// Fetch page size for the remote backend.
pub const ENV_PAGE_SIZE: &str = "DEALFLOW_PAGE_SIZE";
/// First day of the week for weekly activity totals.
pub const ENV_WEEK_START: &str = "DEALFLOW_WEEK_START";

/// Request timeout for the remote backend.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Mock backend settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConfig {
    /// Fixture file; the bundled demo data when `None`.
    pub fixtures: Option<PathBuf>,
    /// Delay added to every store call.
    pub latency: Duration,
}

/// Remote backend settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub project_id: String,
    pub public_key: String,
    pub page_size: usize,
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Fetch window derived from the page size.
    #[must_use]
    pub const fn paging(&self) -> PageInfo {
        PageInfo {
            limit: self.page_size,
            offset: 0,
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("public_key", &"<redacted>")
            .field("page_size", &self.page_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Which store implementation backs the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    Mock(MockConfig),
    Remote(RemoteConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Mock(MockConfig::default())
    }
}

impl BackendConfig {
    /// `mock` or `remote`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mock(_) => "mock",
            Self::Remote(_) => "remote",
        }
    }
}

/// Aggregation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// First day of each reported week.
    pub week_start: Weekday,
    /// How many recent activities the dashboard lists.
    pub recent_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            week_start: Weekday::Sun,
            recent_limit: RECENT_ACTIVITY_LIMIT,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmConfig {
    pub backend: BackendConfig,
    pub analytics: AnalyticsConfig,
}

fn invalid(name: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidSetting {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_setting<T: FromStr>(name: &str, raw: &str, reason: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(name, raw, reason))
}

impl CrmConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| ConfigError::MissingSetting {
                name: name.to_string(),
            })
        };

        let backend_name = get(ENV_BACKEND).unwrap_or_else(|| "mock".to_string());
        let backend = match backend_name.trim().to_ascii_lowercase().as_str() {
            "mock" => {
                let latency = match get(ENV_MOCK_LATENCY_MS).as_deref().map(str::trim) {
                    Some("on" | "true") => SIMULATED_LATENCY,
                    Some(raw) => Duration::from_millis(parse_setting(
                        ENV_MOCK_LATENCY_MS,
                        raw,
                        "expected milliseconds or 'on'",
                    )?),
                    None => Duration::ZERO,
                };
                BackendConfig::Mock(MockConfig {
                    fixtures: get(ENV_FIXTURES).map(PathBuf::from),
                    latency,
                })
            }
            "remote" => {
                let page_size = match get(ENV_PAGE_SIZE) {
                    Some(raw) => {
                        let size: usize = parse_setting(ENV_PAGE_SIZE, &raw, "expected a positive integer")?;
                        if size == 0 {
                            return Err(invalid(ENV_PAGE_SIZE, &raw, "page size must be positive"));
                        }
                        size
                    }
                    None => DEFAULT_PAGE_SIZE,
                };
                BackendConfig::Remote(RemoteConfig {
                    base_url: require(ENV_REMOTE_URL)?,
                    project_id: require(ENV_PROJECT_ID)?,
                    public_key: require(ENV_PUBLIC_KEY)?,
                    page_size,
                    timeout: DEFAULT_REMOTE_TIMEOUT,
                })
            }
            _ => return Err(invalid(ENV_BACKEND, &backend_name, "expected 'mock' or 'remote'")),
        };

        let mut analytics = AnalyticsConfig::default();
        if let Some(raw) = get(ENV_WEEK_START) {
            analytics.week_start = parse_setting(ENV_WEEK_START, &raw, "expected a weekday name")?;
        }

        Ok(Self { backend, analytics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_to_mock() {
        let config = CrmConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CrmConfig::default());
        assert_eq!(config.backend.name(), "mock");
        assert_eq!(config.analytics.week_start, Weekday::Sun);
    }

    #[test]
    fn test_mock_settings() {
        let config = CrmConfig::from_lookup(lookup(&[
            (ENV_FIXTURES, "/tmp/seed.json"),
            (ENV_MOCK_LATENCY_MS, "300"),
            (ENV_WEEK_START, "monday"),
        ]))
        .unwrap();
        let BackendConfig::Mock(mock) = config.backend else {
            panic!("expected mock backend");
        };
        assert_eq!(mock.latency, Duration::from_millis(300));
        assert_eq!(mock.fixtures, Some(PathBuf::from("/tmp/seed.json")));
        assert_eq!(config.analytics.week_start, Weekday::Mon);

        let config = CrmConfig::from_lookup(lookup(&[(ENV_MOCK_LATENCY_MS, "on")])).unwrap();
        let BackendConfig::Mock(mock) = config.backend else {
            panic!("expected mock backend");
        };
        assert_eq!(mock.latency, SIMULATED_LATENCY);
    }

    #[test]
    fn test_remote_requires_credentials() {
        let err = CrmConfig::from_lookup(lookup(&[
            (ENV_BACKEND, "remote"),
            (ENV_REMOTE_URL, "https://records.example.com"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingSetting {
                name: ENV_PROJECT_ID.to_string()
            }
        );
    }

    #[test]
    fn test_remote_settings() {
        let config = CrmConfig::from_lookup(lookup(&[
            (ENV_BACKEND, "Remote"),
            (ENV_REMOTE_URL, "https://records.example.com"),
            (ENV_PROJECT_ID, "proj"),
            (ENV_PUBLIC_KEY, "secret-key"),
            (ENV_PAGE_SIZE, "25"),
        ]))
        .unwrap();
        let BackendConfig::Remote(remote) = &config.backend else {
            panic!("expected remote backend");
        };
        assert_eq!(remote.paging().limit, 25);
        assert!(!format!("{remote:?}").contains("secret-key"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(CrmConfig::from_lookup(lookup(&[(ENV_BACKEND, "sqlite")])).is_err());
        assert!(CrmConfig::from_lookup(lookup(&[(ENV_MOCK_LATENCY_MS, "fast")])).is_err());
        assert!(CrmConfig::from_lookup(lookup(&[(ENV_WEEK_START, "someday")])).is_err());
        let err = CrmConfig::from_lookup(lookup(&[
            (ENV_BACKEND, "remote"),
            (ENV_REMOTE_URL, "u"),
            (ENV_PROJECT_ID, "p"),
            (ENV_PUBLIC_KEY, "k"),
            (ENV_PAGE_SIZE, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { .. }));
    }
}
