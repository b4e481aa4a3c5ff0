//! One-time code and token lifecycle management.
//!
//! Issues, delivers, validates, and invalidates single-use codes: 6-digit
//! OTPs for login/signup confirmation, and opaque tokens for email
//! verification and password reset. At most one unused, unexpired code of a
//! given kind is active per subject; issuing a new one supersedes the rest.

use std::sync::Arc;

use constant_time_eq::constant_time_eq;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::CodeConfig;
use crate::domain::entities::one_time_code::{CodeKind, OneTimeCode};
use crate::errors::{AuthError, CoreResult};
use crate::repositories::code::CodeStore;
use crate::services::notify::Mailer;

/// Lifecycle manager for one-time codes and tokens.
pub struct CodeService<S: CodeStore, M: Mailer> {
    store: Arc<S>,
    mailer: Arc<M>,
    config: CodeConfig,
    clock: Arc<dyn Clock>,
}

impl<S: CodeStore, M: Mailer> CodeService<S, M> {
    pub fn new(store: Arc<S>, mailer: Arc<M>, config: CodeConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            mailer,
            config,
            clock,
        }
    }

    /// Issues a new code of the given kind for a subject.
    ///
    /// Prior unused codes of that kind are invalidated first, then the new
    /// code is stored and delivered. Delivery failure is logged and
    /// swallowed; the code is issued either way.
    pub async fn issue(&self, email: &str, kind: CodeKind) -> CoreResult<String> {
        let now = self.clock.now();

        self.store.delete_unused(email, kind).await?;

        let code = OneTimeCode::new(
            email.to_string(),
            kind,
            now,
            self.config.expiration_minutes(kind),
        );
        let value = code.code.clone();
        self.store.save(code.clone()).await?;

        info!(
            email = email,
            kind = ?kind,
            record_id = %code.id,
            event = "code_issued",
            "Issued one-time code"
        );

        self.deliver(&code).await;
        Ok(value)
    }

    /// Re-delivers the active OTP for a subject if one exists, minting a new
    /// one only when none is valid. Avoids needless invalidation churn.
    pub async fn resend_otp(&self, email: &str) -> CoreResult<String> {
        let now = self.clock.now();

        if let Some(existing) = self.store.find_active(email, CodeKind::Otp, now).await? {
            self.deliver(&existing).await;
            return Ok(existing.code);
        }

        self.issue(email, CodeKind::Otp).await
    }

    /// Consumes an OTP: succeeds iff an unused, unexpired record matches the
    /// subject and code exactly. Single-use; a consumed code never matches
    /// again.
    pub async fn consume_otp(&self, email: &str, code: &str) -> CoreResult<()> {
        let now = self.clock.now();

        let record = self
            .store
            .find_active(email, CodeKind::Otp, now)
            .await?
            .ok_or(AuthError::InvalidOrExpiredCode)?;

        if !constant_time_eq(record.code.as_bytes(), code.as_bytes()) {
            return Err(AuthError::InvalidOrExpiredCode.into());
        }

        self.store.mark_used(record.id).await?;
        info!(
            email = email,
            record_id = %record.id,
            event = "otp_consumed",
            "OTP consumed"
        );
        Ok(())
    }

    /// Consumes an opaque token of the given kind, returning the subject
    /// email it was issued for.
    ///
    /// Fails with [`AuthError::InvalidToken`] when no record matches and
    /// [`AuthError::ExpiredToken`] when the record is past expiry or already
    /// used.
    pub async fn consume_token(&self, token: &str, kind: CodeKind) -> CoreResult<String> {
        let now = self.clock.now();

        let record = self
            .store
            .find_by_code(token, kind)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if record.is_used || record.is_expired(now) {
            return Err(AuthError::ExpiredToken.into());
        }

        self.store.mark_used(record.id).await?;
        info!(
            email = %record.email,
            kind = ?kind,
            record_id = %record.id,
            event = "token_consumed",
            "One-time token consumed"
        );
        Ok(record.email)
    }

    /// Invalidates all active codes of the given kind for a subject.
    pub async fn invalidate_active(&self, email: &str, kind: CodeKind) -> CoreResult<usize> {
        self.store.delete_unused(email, kind).await
    }

    /// Deletes records past expiry. Housekeeping only; `consume` already
    /// rejects expired records.
    pub async fn sweep_expired(&self) -> CoreResult<usize> {
        let removed = self.store.delete_expired(self.clock.now()).await?;
        if removed > 0 {
            info!(removed = removed, "Swept expired one-time codes");
        }
        Ok(removed)
    }

    /// Best-effort delivery; failures are logged with the undelivered value
    /// so an operator can retrieve it in non-production environments.
    async fn deliver(&self, code: &OneTimeCode) {
        let minutes = self.config.expiration_minutes(code.kind);
        let (subject, body) = match code.kind {
            CodeKind::Otp => (
                "Your verification code",
                format!(
                    "Your verification code is: {}\n\nThis code will expire in {} minutes.\n\nIf you didn't request this code, please ignore this email.",
                    code.code, minutes
                ),
            ),
            CodeKind::EmailVerify => (
                "Verify your email address",
                format!(
                    "Use the following token to verify your email address: {}\n\nThis token will expire in {} hours.",
                    code.code,
                    minutes / 60
                ),
            ),
            CodeKind::PasswordReset => (
                "Password reset request",
                format!(
                    "Use the following token to reset your password: {}\n\nThis token will expire in {} minutes.\n\nIf you didn't request a password reset, please ignore this email.",
                    code.code, minutes
                ),
            ),
        };

        if let Err(e) = self.mailer.send(&code.email, subject, &body).await {
            warn!(
                email = %code.email,
                kind = ?code.kind,
                code = %code.code,
                error = %e,
                event = "mail_delivery_failed",
                "Failed to deliver one-time code; code remains valid"
            );
        }
    }
}
