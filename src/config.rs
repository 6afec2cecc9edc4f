//! Client configuration: service base URLs and HTTP timeouts.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

pub const DEFAULT_USER_SERVICE_URL: &str = "http://localhost:5001";
pub const DEFAULT_CATALOG_SERVICE_URL: &str = "http://localhost:5002";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the user service (login, register, verify).
    pub user_service_url: String,
    /// Base URL of the catalog service (recipes).
    pub catalog_service_url: String,
    /// Whole-request timeout. `None` lets a hung request wait indefinitely.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_service_url: DEFAULT_USER_SERVICE_URL.to_owned(),
            catalog_service_url: DEFAULT_CATALOG_SERVICE_URL.to_owned(),
            request_timeout: None,
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Build config for the given base URLs with no timeouts.
    #[must_use]
    pub fn new(user_service_url: &str, catalog_service_url: &str) -> Self {
        Self {
            user_service_url: normalize_base_url(user_service_url),
            catalog_service_url: normalize_base_url(catalog_service_url),
            ..Self::default()
        }
    }

    /// Build config from environment variables, falling back to defaults.
    ///
    /// - `RECIPEBOX_USER_URL`: user service base URL
    /// - `RECIPEBOX_CATALOG_URL`: catalog service base URL
    /// - `RECIPEBOX_REQUEST_TIMEOUT_SECS`: unset means no timeout
    /// - `RECIPEBOX_CONNECT_TIMEOUT_SECS`: unset means the HTTP client default
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading variables through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let user = lookup("RECIPEBOX_USER_URL").unwrap_or_else(|| DEFAULT_USER_SERVICE_URL.to_owned());
        let catalog = lookup("RECIPEBOX_CATALOG_URL")
            .unwrap_or_else(|| DEFAULT_CATALOG_SERVICE_URL.to_owned());
        Self {
            request_timeout: parse_secs(lookup("RECIPEBOX_REQUEST_TIMEOUT_SECS").as_deref()),
            connect_timeout: parse_secs(lookup("RECIPEBOX_CONNECT_TIMEOUT_SECS").as_deref()),
            ..Self::new(&user, &catalog)
        }
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn parse_secs(raw: Option<&str>) -> Option<Duration> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
