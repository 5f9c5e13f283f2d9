//! Application configuration
//!
//! Env-driven with fallbacks suitable for a local backend.

use std::time::Duration;

/// Console configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// REST base URL, including the `/api` prefix
    pub api_base_url: String,
    /// Push channel URL; derived from `api_base_url` when unset
    pub ws_url: Option<String>,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Detection feed + stats pull interval
    pub feed_poll_interval: Duration,
    /// System telemetry pull interval
    pub telemetry_poll_interval: Duration,
    /// Camera list refresh interval
    pub camera_refresh_interval: Duration,
    /// Initial push reconnect delay
    pub push_backoff_initial: Duration,
    /// Push reconnect delay cap
    pub push_backoff_max: Duration,
    /// Consecutive connect failures before the push channel is abandoned
    pub push_max_failures: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: std::env::var("PLATEGUARD_API_URL")
                .unwrap_or_else(|_| "http://localhost:8001/api".to_string()),
            ws_url: std::env::var("PLATEGUARD_WS_URL").ok(),
            request_timeout: duration_from_env("PLATEGUARD_REQUEST_TIMEOUT_SEC", 10),
            feed_poll_interval: duration_from_env("PLATEGUARD_FEED_POLL_SEC", 5),
            telemetry_poll_interval: duration_from_env("PLATEGUARD_TELEMETRY_POLL_SEC", 3),
            camera_refresh_interval: duration_from_env("PLATEGUARD_CAMERA_REFRESH_SEC", 30),
            push_backoff_initial: Duration::from_secs(1),
            push_backoff_max: Duration::from_secs(30),
            push_max_failures: 6,
        }
    }
}

impl AppConfig {
    /// Resolve the push channel URL: explicit override, or the REST base with
    /// the scheme swapped to ws(s) and `/ws/detections` appended.
    pub fn push_channel_url(&self) -> String {
        if let Some(ref url) = self.ws_url {
            return url.clone();
        }
        let base = self
            .api_base_url
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1);
        format!("{}/ws/detections", base.trim_end_matches('/'))
    }
}

fn duration_from_env(key: &str, default_secs: u64) -> Duration {
    let secs = std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_url_derived_from_base() {
        let config = AppConfig {
            api_base_url: "http://backend.local:8001/api".to_string(),
            ws_url: None,
            ..AppConfig::default()
        };
        assert_eq!(
            config.push_channel_url(),
            "ws://backend.local:8001/api/ws/detections"
        );
    }

    #[test]
    fn test_push_url_override_wins() {
        let config = AppConfig {
            ws_url: Some("wss://other/ws".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.push_channel_url(), "wss://other/ws");
    }
}
