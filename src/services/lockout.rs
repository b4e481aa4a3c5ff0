//! Account lockout engine for brute force protection.
//!
//! Tracks failed login attempts per account identity and locks the account
//! for an escalating duration once the threshold is reached. Repeat
//! offenders face exponentially longer lockouts up to a hard cap.
//!
//! Ordering contract: callers check [`is_locked`](LockoutEngine::is_locked)
//! before verifying credentials, then record exactly one outcome per attempt
//! once the result is known.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::LockoutConfig;

/// Per-account security state, process-local and non-durable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct AccountSecurityState {
    failed_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
}

/// Operational snapshot of an account's lockout state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutStatus {
    pub is_locked: bool,
    pub failed_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub remaining_seconds: i64,
}

/// Escalating-lockout engine keyed by account identity.
pub struct LockoutEngine {
    states: DashMap<String, AccountSecurityState>,
    config: LockoutConfig,
    clock: Arc<dyn Clock>,
}

impl LockoutEngine {
    pub fn new(config: LockoutConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            states: DashMap::new(),
            config,
            clock,
        }
    }

    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        Self::new(LockoutConfig::default(), clock)
    }

    /// Whether the account is currently locked. Pure read, never mutates.
    pub fn is_locked(&self, identity: &str) -> bool {
        match self.states.get(identity) {
            Some(state) => match state.locked_until {
                Some(until) => self.clock.now() < until,
                None => false,
            },
            None => false,
        }
    }

    /// Seconds until the current lockout expires, 0 when not locked.
    pub fn remaining_lockout_seconds(&self, identity: &str) -> i64 {
        match self.states.get(identity).and_then(|s| s.locked_until) {
            Some(until) => {
                let now = self.clock.now();
                if now < until {
                    (until - now).num_seconds()
                } else {
                    0
                }
            }
            None => 0,
        }
    }

    /// Records a failed authentication attempt, locking the account when the
    /// threshold is reached.
    pub fn record_failure(&self, identity: &str) {
        let now = self.clock.now();
        let mut state = self.states.entry(identity.to_string()).or_default();

        state.failed_attempts += 1;

        if state.failed_attempts >= self.config.max_failed_attempts {
            let duration = self.lockout_duration(state.failed_attempts);
            state.locked_until = Some(now + duration);

            warn!(
                identity = identity,
                failed_attempts = state.failed_attempts,
                lockout_seconds = duration.num_seconds(),
                event = "account_locked",
                "Account locked after repeated failed login attempts"
            );
        }
    }

    /// Records a successful authentication, fully rehabilitating the account
    /// regardless of prior state.
    pub fn record_success(&self, identity: &str) {
        if self.states.remove(identity).is_some() {
            info!(
                identity = identity,
                "Failed attempt counter reset after successful authentication"
            );
        }
    }

    /// Unconditional administrative unlock.
    pub fn unlock(&self, identity: &str) {
        self.states.remove(identity);
        info!(identity = identity, "Account manually unlocked");
    }

    /// Failed attempts since the last success, for inspection.
    pub fn failed_attempts(&self, identity: &str) -> u32 {
        self.states
            .get(identity)
            .map(|s| s.failed_attempts)
            .unwrap_or(0)
    }

    /// Snapshot of the account's lockout state for operator tooling.
    pub fn status(&self, identity: &str) -> LockoutStatus {
        let state = self
            .states
            .get(identity)
            .map(|s| *s)
            .unwrap_or_default();

        LockoutStatus {
            is_locked: self.is_locked(identity),
            failed_attempts: state.failed_attempts,
            locked_until: state.locked_until,
            remaining_seconds: self.remaining_lockout_seconds(identity),
        }
    }

    /// Lockout duration for the given cumulative attempt count.
    ///
    /// The first trigger (attempts == threshold) locks for the base
    /// duration. Beyond that the multiplier grows stepwise with each full
    /// threshold of overflow attempts, scaled by the backoff factor and
    /// capped.
    fn lockout_duration(&self, attempts: u32) -> Duration {
        let threshold = self.config.max_failed_attempts;
        let multiplier = if attempts > threshold {
            let steps = (attempts - threshold) / threshold + 1;
            (steps * self.config.backoff_multiplier).min(self.config.cap_multiplier)
        } else {
            1
        };

        Duration::seconds(self.config.base_lockout_seconds * i64::from(multiplier))
    }
}
