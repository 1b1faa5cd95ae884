//! Request admission: API key check plus fixed-window rate limiting.
//!
//! Both checks run before any conversion work. Authentication is evaluated
//! first — a request with no credential is rejected as `missing_api_key`
//! even when the server's allow-set is also empty — and the rate limit is
//! keyed by the authenticated credential.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::{RateLimitConfig, ServerConfig};
use crate::error::GateError;

/// Admits or rejects inbound conversion requests.
pub struct ApiGate {
    keys: Vec<String>,
    limiter: RateLimiter,
}

impl ApiGate {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            keys: config.api_keys.clone(),
            limiter: RateLimiter::new(config.rate_limit.clone()),
        }
    }

    /// Run both admission checks for a request.
    ///
    /// Rejection order: missing credential, empty allow-set, unknown key,
    /// then the rate limit for the admitted credential.
    pub fn admit(&self, credential: Option<&str>) -> Result<(), GateError> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(GateError::MissingApiKey)?;

        if self.keys.is_empty() {
            return Err(GateError::NoKeysConfigured);
        }
        if !self.keys.iter().any(|k| k == credential) {
            return Err(GateError::InvalidApiKey);
        }

        self.limiter.check(credential, Instant::now())
    }
}

/// Fixed-window counter per credential.
struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

struct Window {
    started: Instant,
    admitted: u32,
}

impl RateLimiter {
    fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn window(&self) -> Duration {
        Duration::from_millis(self.config.window_ms)
    }

    fn check(&self, key: &str, now: Instant) -> Result<(), GateError> {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            admitted: 0,
        });

        if now.duration_since(window.started) >= self.window() {
            window.started = now;
            window.admitted = 0;
        }

        if window.admitted >= self.config.max_requests {
            let elapsed = now.duration_since(window.started);
            let remaining = self.window().saturating_sub(elapsed);
            return Err(GateError::RateLimited {
                retry_after_secs: remaining.as_secs().max(1),
            });
        }

        window.admitted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_config(keys: &[&str], max_requests: u32, window_ms: u64) -> ServerConfig {
        ServerConfig {
            api_keys: keys.iter().map(|k| k.to_string()).collect(),
            rate_limit: RateLimitConfig {
                max_requests,
                window_ms,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_key_is_admitted() {
        let gate = ApiGate::new(&server_config(&["secret"], 10, 60_000));
        assert!(gate.admit(Some("secret")).is_ok());
    }

    #[test]
    fn test_missing_key_rejected_before_empty_allow_set() {
        // Missing-credential check precedes allow-set-empty check
        let gate = ApiGate::new(&server_config(&[], 10, 60_000));
        assert_eq!(gate.admit(None), Err(GateError::MissingApiKey));
        assert_eq!(gate.admit(Some("")), Err(GateError::MissingApiKey));
        assert_eq!(gate.admit(Some("   ")), Err(GateError::MissingApiKey));
    }

    #[test]
    fn test_empty_allow_set_rejected_with_distinct_reason() {
        let gate = ApiGate::new(&server_config(&[], 10, 60_000));
        assert_eq!(gate.admit(Some("anything")), Err(GateError::NoKeysConfigured));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let gate = ApiGate::new(&server_config(&["secret"], 10, 60_000));
        assert_eq!(gate.admit(Some("wrong")), Err(GateError::InvalidApiKey));
    }

    #[test]
    fn test_rate_limit_rejects_after_window_budget() {
        let gate = ApiGate::new(&server_config(&["secret"], 3, 60_000));
        for _ in 0..3 {
            assert!(gate.admit(Some("secret")).is_ok());
        }
        assert!(matches!(
            gate.admit(Some("secret")),
            Err(GateError::RateLimited { .. })
        ));
    }

    #[test]
    fn test_rate_limit_is_per_credential() {
        let gate = ApiGate::new(&server_config(&["a", "b"], 1, 60_000));
        assert!(gate.admit(Some("a")).is_ok());
        assert!(matches!(
            gate.admit(Some("a")),
            Err(GateError::RateLimited { .. })
        ));
        // A different credential has its own window
        assert!(gate.admit(Some("b")).is_ok());
    }

    #[test]
    fn test_window_resets_after_duration() {
        let gate = ApiGate::new(&server_config(&["secret"], 1, 20));
        assert!(gate.admit(Some("secret")).is_ok());
        assert!(gate.admit(Some("secret")).is_err());
        std::thread::sleep(Duration::from_millis(30));
        assert!(gate.admit(Some("secret")).is_ok());
    }

    #[test]
    fn test_rejected_requests_do_not_consume_budget() {
        let gate = ApiGate::new(&server_config(&["secret"], 2, 60_000));
        // Failed auth attempts never reach the limiter
        for _ in 0..5 {
            assert_eq!(gate.admit(Some("wrong")), Err(GateError::InvalidApiKey));
        }
        assert!(gate.admit(Some("secret")).is_ok());
        assert!(gate.admit(Some("secret")).is_ok());
    }
}
