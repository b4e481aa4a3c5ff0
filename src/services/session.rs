//! Stateless session token issuance and validation.
//!
//! Access and refresh tokens are self-contained signed claim sets; validity
//! is signature integrity plus the expiry claim. There is no server-side
//! store or revocation list: logout is a client-side token discard.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::clock::Clock;
use crate::config::SessionTokenConfig;
use crate::domain::entities::session::{Claims, SessionTokens, TokenType};
use crate::errors::{AuthError, CoreResult, TokenError};
use crate::repositories::account::AccountStore;

/// Issues and validates signed, stateless session credentials.
pub struct SessionTokenIssuer {
    config: SessionTokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl SessionTokenIssuer {
    pub fn new(config: SessionTokenConfig, clock: Arc<dyn Clock>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        // Expiry is checked against the injected clock, not the library's
        // view of system time
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
            clock,
        }
    }

    /// Issues an access token (and a refresh token when configured) for the
    /// given subject identity.
    pub fn issue(&self, subject: &str) -> CoreResult<SessionTokens> {
        let now = self.clock.now();

        let access_claims = Claims::new(
            subject,
            TokenType::Access,
            &self.config.issuer,
            &self.config.audience,
            now,
            Duration::minutes(self.config.access_ttl_minutes),
        );
        let access_token = self.encode(&access_claims)?;

        let refresh_token = if self.config.issue_refresh {
            let refresh_claims = Claims::new(
                subject,
                TokenType::Refresh,
                &self.config.issuer,
                &self.config.audience,
                now,
                Duration::days(self.config.refresh_ttl_days),
            );
            Some(self.encode(&refresh_claims)?)
        } else {
            None
        };

        Ok(SessionTokens {
            access_token,
            refresh_token,
            expires_in: self.config.access_ttl_minutes * 60,
        })
    }

    /// Validates a token's signature, issuer/audience, and expiry, returning
    /// its claims.
    pub fn validate(&self, token: &str) -> CoreResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer
                | jsonwebtoken::errors::ErrorKind::InvalidAudience => TokenError::InvalidClaims,
                _ => TokenError::InvalidTokenFormat,
            }
        })?;

        let now = self.clock.now();
        if data.claims.is_expired(now) {
            return Err(TokenError::TokenExpired.into());
        }
        if now.timestamp() < data.claims.nbf {
            return Err(TokenError::InvalidClaims.into());
        }

        Ok(data.claims)
    }

    /// The subject identity carried by a valid token.
    pub fn subject_of(&self, token: &str) -> CoreResult<String> {
        Ok(self.validate(token)?.sub)
    }

    /// Exchanges a valid refresh token for a fresh token pair.
    ///
    /// Re-resolves the subject against the live account store: refresh is
    /// rejected when the account no longer exists or is disabled.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        accounts: &dyn AccountStore,
    ) -> CoreResult<SessionTokens> {
        let claims = self.validate(refresh_token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(TokenError::WrongTokenType.into());
        }

        let account = accounts
            .find_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        if !account.is_active {
            return Err(AuthError::AccountDisabled.into());
        }

        self.issue(&account.email)
    }

    fn encode(&self, claims: &Claims) -> CoreResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|_| TokenError::TokenGenerationFailed.into())
    }
}
