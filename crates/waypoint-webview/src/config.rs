use std::time::Duration;

/// Configuration for one embedded webview instance.
#[derive(Debug, Clone)]
pub struct WebViewConfig {
    /// Custom user agent string.
    pub user_agent: Option<String>,
    /// Whether to enable dev tools (always on in debug builds).
    pub devtools: bool,
    /// Whether the webview background should be transparent.
    pub transparent: bool,
    /// Upper bound on the initialization handshake. A native layer that never
    /// calls back faults the instance instead of hanging the caller.
    pub init_timeout: Duration,
    /// Upper bound on a single script execution. Expiry is a per-call
    /// failure, surfaced to the caller as an empty result.
    pub script_timeout: Duration,
}

impl Default for WebViewConfig {
    fn default() -> Self {
        Self {
            user_agent: Some("Waypoint/0.1".to_string()),
            devtools: cfg!(debug_assertions),
            transparent: false,
            init_timeout: Duration::from_secs(30),
            script_timeout: Duration::from_secs(10),
        }
    }
}

impl WebViewConfig {
    /// Create a config with tighter bounds on both suspending operations.
    pub fn with_timeouts(init_timeout: Duration, script_timeout: Duration) -> Self {
        Self {
            init_timeout,
            script_timeout,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_bounded_waits() {
        let config = WebViewConfig::default();
        assert_eq!(config.init_timeout, Duration::from_secs(30));
        assert_eq!(config.script_timeout, Duration::from_secs(10));
        assert!(config.user_agent.is_some());
    }

    #[test]
    fn with_timeouts_overrides_only_waits() {
        let config =
            WebViewConfig::with_timeouts(Duration::from_millis(50), Duration::from_millis(20));
        assert_eq!(config.init_timeout, Duration::from_millis(50));
        assert_eq!(config.script_timeout, Duration::from_millis(20));
        assert_eq!(config.transparent, WebViewConfig::default().transparent);
    }
}
