//! Configuration for the authentication core components.
//!
//! Each component takes a plain config struct with production defaults that
//! match the deployed system: 5 login attempts per 15 minutes, 3 OTP requests
//! per hour, lockout after 5 failed logins with exponential backoff capped at
//! 8x the base duration.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::entities::one_time_code::CodeKind;

/// A fixed-window limit: at most `max_requests` per `window_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitPolicy {
    /// Maximum requests allowed within one window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_seconds: i64,
}

impl LimitPolicy {
    pub fn new(max_requests: u32, window_seconds: i64) -> Self {
        Self {
            max_requests,
            window_seconds,
        }
    }
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,

    /// Limit for login attempts per client (default: 5 per 15 minutes)
    pub login: LimitPolicy,

    /// Limit for OTP requests per client (default: 3 per hour)
    pub otp_request: LimitPolicy,

    /// Client identities exempt from limiting.
    ///
    /// Defaults to the loopback addresses. This is a development aid, not a
    /// security boundary.
    pub exempt: HashSet<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let mut exempt = HashSet::new();
        exempt.insert("127.0.0.1".to_string());
        exempt.insert("::1".to_string());

        Self {
            enabled: true,
            login: LimitPolicy::new(5, 15 * 60),
            otp_request: LimitPolicy::new(3, 60 * 60),
            exempt,
        }
    }
}

/// Account lockout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutConfig {
    /// Failed attempts before the account is locked (default: 5)
    pub max_failed_attempts: u32,

    /// Base lockout duration in seconds (default: 1800 = 30 minutes)
    pub base_lockout_seconds: i64,

    /// Backoff factor applied to repeat offenders (default: 2)
    pub backoff_multiplier: u32,

    /// Hard cap on the lockout multiplier (default: 8)
    pub cap_multiplier: u32,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            base_lockout_seconds: 30 * 60,
            backoff_multiplier: 2,
            cap_multiplier: 8,
        }
    }
}

/// One-time code and token lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeConfig {
    /// OTP lifetime in minutes (default: 10)
    pub otp_expiration_minutes: i64,

    /// Email verification token lifetime in minutes (default: 24 hours)
    pub email_verify_expiration_minutes: i64,

    /// Password reset token lifetime in minutes (default: 1 hour)
    pub password_reset_expiration_minutes: i64,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            otp_expiration_minutes: 10,
            email_verify_expiration_minutes: 24 * 60,
            password_reset_expiration_minutes: 60,
        }
    }
}

impl CodeConfig {
    /// Lifetime in minutes for a code of the given kind.
    pub fn expiration_minutes(&self, kind: CodeKind) -> i64 {
        match kind {
            CodeKind::Otp => self.otp_expiration_minutes,
            CodeKind::EmailVerify => self.email_verify_expiration_minutes,
            CodeKind::PasswordReset => self.password_reset_expiration_minutes,
        }
    }
}

/// Session token issuer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokenConfig {
    /// HMAC signing secret
    pub secret: String,

    /// Expected `iss` claim
    pub issuer: String,

    /// Expected `aud` claim
    pub audience: String,

    /// Access token lifetime in minutes (default: 15)
    pub access_ttl_minutes: i64,

    /// Refresh token lifetime in days (default: 7)
    pub refresh_ttl_days: i64,

    /// Whether `issue` also mints a refresh token (default: true)
    pub issue_refresh: bool,
}

impl SessionTokenConfig {
    /// Builds a config with the given secret and default lifetimes.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: "auth-core".to_string(),
            audience: "auth-core-api".to_string(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
            issue_refresh: true,
        }
    }
}
