//! Service configuration: application constants plus the immutable runtime
//! configuration assembled once at startup from the environment.
//!
//! The config value is built in `main`, wrapped in an `Arc`, and handed to
//! each component at construction time. Nothing re-reads the environment
//! after startup.

use std::net::SocketAddr;
use std::time::Duration;

use tracing::warn;

/// Application-level constants
pub const APP_NAME: &str = "freshlens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Baseline shelf-life guess (days) used when the remote model is
/// unavailable or declines to answer.
const DEFAULT_SHELF_LIFE_DAYS: u32 = 3;
/// Upper bound (days) for any estimate. Remote answers are clamped to this
/// value for sanity.
const DEFAULT_MAX_SHELF_LIFE_DAYS: u32 = 30;
/// Timeout for fetching product images.
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 10;
/// Timeout for remote completion calls.
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 18;
/// Model identifier sent to the remote endpoint.
const DEFAULT_REMOTE_MODEL: &str = "grok-1";
/// Listen address for the HTTP server.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8600";

/// Remote model endpoint coordinates. Both values must be present for the
/// remote adapter to be enabled.
#[derive(Debug, Clone)]
pub struct RemoteEndpoint {
    /// Chat-completions URL.
    pub url: String,
    /// Bearer credential.
    pub api_key: String,
}

/// Process-wide estimation configuration. Loaded once, read-only thereafter;
/// all estimation requests share it.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Starting score for the heuristic estimator.
    pub default_shelf_life_days: u32,
    /// Ceiling applied to every estimate regardless of source.
    pub max_shelf_life_days: u32,
    pub download_timeout: Duration,
    pub remote_timeout: Duration,
    /// Model identifier sent with every remote request.
    pub remote_model: String,
    /// `None` disables the remote adapter; the service then runs
    /// heuristic-only.
    pub remote: Option<RemoteEndpoint>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            default_shelf_life_days: DEFAULT_SHELF_LIFE_DAYS,
            max_shelf_life_days: DEFAULT_MAX_SHELF_LIFE_DAYS,
            download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            remote_timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
            remote_model: DEFAULT_REMOTE_MODEL.to_string(),
            remote: None,
        }
    }
}

impl EstimatorConfig {
    /// Assemble the config from `FRESHLENS_*` environment variables.
    ///
    /// Absent or malformed overrides fall back to the built-in defaults
    /// (malformed values are logged at warn, not fatal). The remote adapter
    /// is enabled only when both the endpoint URL and the credential are
    /// set and non-empty.
    pub fn from_env() -> Self {
        let (default_days, max_days) = normalize_bounds(
            u32_var(
                "FRESHLENS_DEFAULT_SHELF_LIFE_DAYS",
                DEFAULT_SHELF_LIFE_DAYS,
            ),
            u32_var("FRESHLENS_MAX_SHELF_LIFE_DAYS", DEFAULT_MAX_SHELF_LIFE_DAYS),
        );

        let remote = match (
            non_empty_var("FRESHLENS_REMOTE_URL"),
            non_empty_var("FRESHLENS_REMOTE_API_KEY"),
        ) {
            (Some(url), Some(api_key)) => Some(RemoteEndpoint { url, api_key }),
            _ => None,
        };

        Self {
            default_shelf_life_days: default_days,
            max_shelf_life_days: max_days,
            download_timeout: Duration::from_secs(u64_var(
                "FRESHLENS_DOWNLOAD_TIMEOUT_SECS",
                DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            )),
            remote_timeout: Duration::from_secs(u64_var(
                "FRESHLENS_REMOTE_TIMEOUT_SECS",
                DEFAULT_REMOTE_TIMEOUT_SECS,
            )),
            remote_model: non_empty_var("FRESHLENS_REMOTE_MODEL")
                .unwrap_or_else(|| DEFAULT_REMOTE_MODEL.to_string()),
            remote,
        }
    }

    /// Whether the remote inference adapter has an endpoint to call.
    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }
}

/// Listen address from `FRESHLENS_BIND_ADDR`, or the default.
pub fn bind_addr_from_env() -> SocketAddr {
    match non_empty_var("FRESHLENS_BIND_ADDR") {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(value = %raw, "Ignoring malformed FRESHLENS_BIND_ADDR");
            default_bind_addr()
        }),
        None => default_bind_addr(),
    }
}

fn default_bind_addr() -> SocketAddr {
    DEFAULT_BIND_ADDR
        .parse()
        .expect("Default bind address is valid")
}

/// Enforce the config invariants: `default >= 1` and `max >= default`.
fn normalize_bounds(default_days: u32, max_days: u32) -> (u32, u32) {
    let default_days = default_days.max(1);
    if max_days < default_days {
        warn!(
            max_days,
            default_days, "Max shelf life below default; raising to default"
        );
        return (default_days, default_days);
    }
    (default_days, max_days)
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn u32_var(name: &str, default: u32) -> u32 {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(var = name, value = %raw, "Ignoring malformed numeric override");
            default
        }),
        Err(_) => default,
    }
}

fn u64_var(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(var = name, value = %raw, "Ignoring malformed numeric override");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let config = EstimatorConfig::default();
        assert_eq!(config.default_shelf_life_days, 3);
        assert_eq!(config.max_shelf_life_days, 30);
        assert_eq!(config.download_timeout, Duration::from_secs(10));
        assert_eq!(config.remote_timeout, Duration::from_secs(18));
        assert_eq!(config.remote_model, "grok-1");
        assert!(!config.remote_enabled());
    }

    #[test]
    fn remote_enabled_requires_endpoint() {
        let mut config = EstimatorConfig::default();
        assert!(!config.remote_enabled());

        config.remote = Some(RemoteEndpoint {
            url: "https://model.example/v1/chat/completions".into(),
            api_key: "secret".into(),
        });
        assert!(config.remote_enabled());
    }

    // Single test touching the process environment; keeps env mutation
    // out of the other (parallel) tests.
    #[test]
    fn env_overrides_and_fallbacks() {
        std::env::remove_var("FRESHLENS_REMOTE_URL");
        std::env::remove_var("FRESHLENS_REMOTE_API_KEY");
        let config = EstimatorConfig::from_env();
        assert!(!config.remote_enabled());

        std::env::set_var("FRESHLENS_REMOTE_URL", "https://model.example/v1");
        std::env::set_var("FRESHLENS_REMOTE_API_KEY", "secret");
        std::env::set_var("FRESHLENS_MAX_SHELF_LIFE_DAYS", "not-a-number");
        std::env::set_var("FRESHLENS_DEFAULT_SHELF_LIFE_DAYS", "5");
        let config = EstimatorConfig::from_env();
        assert!(config.remote_enabled());
        assert_eq!(config.default_shelf_life_days, 5);
        // Malformed max falls back to the default, which still satisfies
        // max >= default here.
        assert_eq!(config.max_shelf_life_days, 30);

        std::env::remove_var("FRESHLENS_REMOTE_URL");
        std::env::remove_var("FRESHLENS_REMOTE_API_KEY");
        std::env::remove_var("FRESHLENS_MAX_SHELF_LIFE_DAYS");
        std::env::remove_var("FRESHLENS_DEFAULT_SHELF_LIFE_DAYS");
    }

    #[test]
    fn bounds_normalization() {
        assert_eq!(normalize_bounds(3, 30), (3, 30));
        assert_eq!(normalize_bounds(7, 4), (7, 7));
        assert_eq!(normalize_bounds(0, 0), (1, 1));
    }
}
