//! Session token entities: JWT claims and issued token pairs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes access from refresh tokens in the claim set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by a signed session token.
///
/// Validity is purely signature integrity plus the `exp` claim; there is no
/// server-side record of issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identity (account email)
    pub sub: String,

    /// Issued at (unix seconds)
    pub iat: i64,

    /// Expiration (unix seconds)
    pub exp: i64,

    /// Not before (unix seconds)
    pub nbf: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Unique token identifier
    pub jti: String,

    /// Access or refresh
    pub token_type: TokenType,
}

impl Claims {
    /// Creates a claim set for the given subject and lifetime.
    pub fn new(
        subject: &str,
        token_type: TokenType,
        issuer: &str,
        audience: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().to_string(),
            token_type,
        }
    }

    /// Whether the claims are expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Tokens handed to the client after successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Signed access token
    pub access_token: String,

    /// Signed refresh token, when refresh issuance is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}
