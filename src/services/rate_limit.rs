//! Fixed-window rate limiter for authentication endpoints.
//!
//! Each (client identity, limit class) pair gets its own counter; exhausting
//! the login budget leaves the OTP budget untouched. The fixed-window scheme
//! deliberately admits up to 2x the threshold across a window edge; that
//! boundary artifact is the accepted semantics, not a defect.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{LimitPolicy, RateLimitConfig};
use crate::errors::{AuthError, CoreResult};
use crate::services::counter::CounterStore;

/// Endpoint class a request is limited under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitClass {
    /// Login attempts
    Login,
    /// OTP issuance and resend requests
    OtpRequest,
}

/// Counter snapshot for one limit class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStatus {
    pub count: u32,
    pub limit: u32,
}

/// Operational snapshot of a client's budgets across all classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub login: ClassStatus,
    pub otp_request: ClassStatus,
}

/// Fixed-window rate limiter keyed by (client identity, limit class).
pub struct RateLimiter {
    counters: CounterStore<(String, LimitClass)>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            counters: CounterStore::new(clock),
            config,
        }
    }

    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        Self::new(RateLimitConfig::default(), clock)
    }

    fn policy(&self, class: LimitClass) -> LimitPolicy {
        match class {
            LimitClass::Login => self.config.login,
            LimitClass::OtpRequest => self.config.otp_request,
        }
    }

    /// Records one request and decides whether it is within the budget.
    ///
    /// Unknown client identities start a fresh counter; malformed input is
    /// never an error. Exempt identities bypass counting entirely.
    pub fn allow(&self, client_id: &str, class: LimitClass) -> bool {
        if !self.config.enabled {
            return true;
        }
        if self.config.exempt.contains(client_id) {
            debug!(client_id = client_id, "Rate limiting bypassed for exempt client");
            return true;
        }

        let policy = self.policy(class);
        let window = Duration::seconds(policy.window_seconds);
        let count = self
            .counters
            .increment((client_id.to_string(), class), window);

        if count > policy.max_requests {
            warn!(
                client_id = client_id,
                class = ?class,
                count = count,
                limit = policy.max_requests,
                "Rate limit exceeded"
            );
            false
        } else {
            true
        }
    }

    /// Same decision as [`allow`](Self::allow), surfaced as an error carrying
    /// the remaining window time as a retry-after hint.
    pub fn check(&self, client_id: &str, class: LimitClass) -> CoreResult<()> {
        if self.allow(client_id, class) {
            return Ok(());
        }

        let policy = self.policy(class);
        let window = Duration::seconds(policy.window_seconds);
        let retry_after_seconds = self
            .counters
            .remaining_window(&(client_id.to_string(), class), window)
            .unwrap_or(window)
            .num_seconds();

        Err(AuthError::RateLimited {
            retry_after_seconds,
        }
        .into())
    }

    /// Clears all budgets for a client. Administrative.
    pub fn clear(&self, client_id: &str) {
        self.counters.clear(&(client_id.to_string(), LimitClass::Login));
        self.counters
            .clear(&(client_id.to_string(), LimitClass::OtpRequest));
        info!(client_id = client_id, "Rate limit cleared");
    }

    /// Current counts against limits for a client, for operator tooling.
    pub fn status(&self, client_id: &str) -> RateLimitStatus {
        let status_for = |class: LimitClass| {
            let policy = self.policy(class);
            ClassStatus {
                count: self.counters.count(
                    &(client_id.to_string(), class),
                    Duration::seconds(policy.window_seconds),
                ),
                limit: policy.max_requests,
            }
        };

        RateLimitStatus {
            login: status_for(LimitClass::Login),
            otp_request: status_for(LimitClass::OtpRequest),
        }
    }
}

/// Resolves the client identity from transport and proxy headers.
///
/// Prefers the first X-Forwarded-For entry, then X-Real-IP, then the peer
/// address. The headers are spoofable without a trusted reverse proxy in
/// front; deployments must strip or set them at that boundary.
pub fn resolve_client_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    peer_addr: &str,
) -> String {
    if let Some(header) = forwarded_for {
        let first = header.split(',').next().unwrap_or("").trim();
        if !first.is_empty() && !first.eq_ignore_ascii_case("unknown") {
            return first.to_string();
        }
    }

    if let Some(header) = real_ip {
        let value = header.trim();
        if !value.is_empty() && !value.eq_ignore_ascii_case("unknown") {
            return value.to_string();
        }
    }

    peer_addr.to_string()
}
