//! One-time code entity for email verification, password reset, and login
//! confirmation flows.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of a numeric OTP code.
pub const OTP_LENGTH: usize = 6;

/// The kind of single-use code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    /// 6-digit numeric code delivered by email
    Otp,
    /// Opaque email verification token
    EmailVerify,
    /// Opaque password reset token
    PasswordReset,
}

/// A single-use code or token bound to one subject email.
///
/// At most one unused, unexpired code of a given kind is considered active
/// per subject; issuing a new one supersedes prior unused codes of that kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeCode {
    /// Unique identifier for the record
    pub id: Uuid,

    /// Subject email the code was issued for
    pub email: String,

    /// The code or token value
    pub code: String,

    /// What flow this code belongs to
    pub kind: CodeKind,

    /// Timestamp when the code was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the code expires
    pub expires_at: DateTime<Utc>,

    /// Whether the code has been consumed
    pub is_used: bool,
}

impl OneTimeCode {
    /// Creates a new code of the given kind.
    ///
    /// OTPs get a uniform 6-digit numeric code in [100000, 999999]; the
    /// opaque kinds get a UUID-grade random token.
    pub fn new(email: String, kind: CodeKind, now: DateTime<Utc>, expiration_minutes: i64) -> Self {
        let code = match kind {
            CodeKind::Otp => Self::generate_otp(),
            CodeKind::EmailVerify | CodeKind::PasswordReset => Uuid::new_v4().to_string(),
        };

        Self {
            id: Uuid::new_v4(),
            email,
            code,
            kind,
            created_at: now,
            expires_at: now + Duration::minutes(expiration_minutes),
            is_used: false,
        }
    }

    /// Generates a uniform 6-digit numeric code.
    fn generate_otp() -> String {
        let mut rng = rand::thread_rng();
        let code: u32 = rng.gen_range(100_000..1_000_000);
        code.to_string()
    }

    /// Whether the code is past its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the code can still be consumed at `now`.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && !self.is_expired(now)
    }

    /// Marks the code as consumed.
    pub fn mark_used(&mut self) {
        self.is_used = true;
    }

    /// Time remaining until expiry, zero if already expired.
    pub fn time_until_expiration(&self, now: DateTime<Utc>) -> Duration {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }
}
