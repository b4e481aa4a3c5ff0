//! Authentication flow orchestration.
//!
//! Wires the rate limiter, lockout engine, code lifecycle, and session
//! issuer into the register/login/verify/reset flows. An inbound request is
//! rejected fast on a rate limit violation, then gated on account lockout
//! before credentials are ever checked; the verification outcome feeds back
//! into the lockout engine exactly once per attempt.

use std::sync::Arc;

use constant_time_eq::constant_time_eq;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::domain::entities::account::Account;
use crate::domain::entities::one_time_code::CodeKind;
use crate::domain::entities::session::SessionTokens;
use crate::errors::{AuthError, CoreResult};
use crate::repositories::account::AccountStore;
use crate::repositories::code::CodeStore;
use crate::services::codes::CodeService;
use crate::services::lockout::LockoutEngine;
use crate::services::notify::Mailer;
use crate::services::rate_limit::{LimitClass, RateLimiter};
use crate::services::session::SessionTokenIssuer;

/// One-way password hash, pluggable by design.
///
/// Algorithm selection is out of scope for the core; deployments plug in a
/// memory-hard implementation behind this trait.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// SHA-256 hasher used as the default plug and in tests.
///
/// Deterministic and unsalted; not suitable for production credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256PasswordHasher;

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        constant_time_eq(self.hash(password).as_bytes(), hash.as_bytes())
    }
}

/// Orchestrates the authentication flows over the core components.
pub struct AuthService<A, S, M, H>
where
    A: AccountStore,
    S: CodeStore,
    M: Mailer,
    H: PasswordHasher,
{
    accounts: Arc<A>,
    codes: CodeService<S, M>,
    rate_limiter: RateLimiter,
    lockout: LockoutEngine,
    sessions: SessionTokenIssuer,
    hasher: H,
}

impl<A, S, M, H> AuthService<A, S, M, H>
where
    A: AccountStore,
    S: CodeStore,
    M: Mailer,
    H: PasswordHasher,
{
    pub fn new(
        accounts: Arc<A>,
        codes: CodeService<S, M>,
        rate_limiter: RateLimiter,
        lockout: LockoutEngine,
        sessions: SessionTokenIssuer,
        hasher: H,
    ) -> Self {
        Self {
            accounts,
            codes,
            rate_limiter,
            lockout,
            sessions,
            hasher,
        }
    }

    /// Registers a new account and issues an email verification OTP.
    ///
    /// Registration succeeds even when code delivery fails; the failure is
    /// logged and the stored code remains consumable.
    pub async fn register(
        &self,
        client_id: &str,
        email: &str,
        password: &str,
    ) -> CoreResult<Account> {
        self.rate_limiter.check(client_id, LimitClass::OtpRequest)?;

        if self.accounts.exists_by_email(email).await? {
            return Err(AuthError::EmailAlreadyRegistered.into());
        }

        let account = Account::new(email.to_string(), self.hasher.hash(password));
        let account = self.accounts.save(account).await?;

        info!(email = email, account_id = %account.id, "Account registered");

        self.codes.issue(email, CodeKind::Otp).await?;
        Ok(account)
    }

    /// Authenticates a login attempt and issues session tokens.
    ///
    /// Order: rate limit, lockout gate, credential check. Exactly one
    /// outcome is recorded against the lockout engine per attempt.
    pub async fn login(
        &self,
        client_id: &str,
        email: &str,
        password: &str,
    ) -> CoreResult<SessionTokens> {
        self.rate_limiter.check(client_id, LimitClass::Login)?;

        if self.lockout.is_locked(email) {
            return Err(AuthError::AccountLocked {
                retry_after_seconds: self.lockout.remaining_lockout_seconds(email),
            }
            .into());
        }

        let account = match self.accounts.find_by_email(email).await? {
            Some(account) => account,
            // Unknown identity: no lockout state to feed
            None => return Err(AuthError::InvalidCredentials.into()),
        };

        if !account.is_active {
            return Err(AuthError::AccountDisabled.into());
        }

        if !self.hasher.verify(password, &account.password_hash) {
            self.lockout.record_failure(email);
            warn!(email = email, client_id = client_id, "Failed login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }

        self.lockout.record_success(email);

        if !account.email_verified {
            return Err(AuthError::EmailNotVerified.into());
        }

        info!(email = email, "Login succeeded");
        self.sessions.issue(email)
    }

    /// Consumes an email verification OTP and marks the account verified.
    pub async fn verify_email(&self, email: &str, code: &str) -> CoreResult<()> {
        self.codes.consume_otp(email, code).await?;

        let mut account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        account.mark_verified();
        self.accounts.save(account).await?;

        info!(email = email, "Email verified");
        Ok(())
    }

    /// Re-delivers the pending verification OTP, or mints a new one if none
    /// is valid.
    pub async fn resend_verification(&self, client_id: &str, email: &str) -> CoreResult<()> {
        self.rate_limiter.check(client_id, LimitClass::OtpRequest)?;
        self.codes.resend_otp(email).await?;
        Ok(())
    }

    /// Issues a password reset token.
    ///
    /// Unknown emails succeed silently so the endpoint cannot be used to
    /// enumerate accounts.
    pub async fn request_password_reset(&self, client_id: &str, email: &str) -> CoreResult<()> {
        self.rate_limiter.check(client_id, LimitClass::OtpRequest)?;

        if !self.accounts.exists_by_email(email).await? {
            info!(email = email, "Password reset requested for unknown email");
            return Ok(());
        }

        self.codes.issue(email, CodeKind::PasswordReset).await?;
        Ok(())
    }

    /// Consumes a reset token and replaces the account's password.
    ///
    /// Also clears any lockout state: the subject has proven control of the
    /// mailbox.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> CoreResult<()> {
        let email = self
            .codes
            .consume_token(token, CodeKind::PasswordReset)
            .await?;

        let mut account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        account.set_password_hash(self.hasher.hash(new_password));
        self.accounts.save(account).await?;

        self.lockout.unlock(&email);
        info!(email = %email, "Password reset completed");
        Ok(())
    }

    /// Exchanges a refresh token for a fresh session token pair.
    pub async fn refresh(&self, refresh_token: &str) -> CoreResult<SessionTokens> {
        self.sessions.refresh(refresh_token, &*self.accounts).await
    }

    /// Validates an access token and returns its subject identity.
    pub fn authenticate(&self, access_token: &str) -> CoreResult<String> {
        self.sessions.subject_of(access_token)
    }

    /// Deletes expired one-time codes. Housekeeping.
    pub async fn sweep_expired_codes(&self) -> CoreResult<usize> {
        self.codes.sweep_expired().await
    }

    /// Administrative: clears rate-limit budgets for a client identity.
    pub fn clear_rate_limit(&self, client_id: &str) {
        self.rate_limiter.clear(client_id);
    }

    /// Administrative: unconditionally unlocks an account.
    pub fn unlock_account(&self, email: &str) {
        self.lockout.unlock(email);
    }

    /// Rate limiter handle for operational inspection.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Lockout engine handle for operational inspection.
    pub fn lockout(&self) -> &LockoutEngine {
        &self.lockout
    }
}
