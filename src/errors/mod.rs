//! Domain-specific error types for authentication and abuse control.
//!
//! All errors here are recoverable at the caller's discretion: rate limits
//! and lockouts clear with time, invalid codes can be re-requested, and
//! expired session tokens can be refreshed. None are fatal to the process.

use thiserror::Error;

/// Authentication and abuse-control errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Too many requests. Please try again in {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: i64 },

    #[error("Account locked. Please try again in {retry_after_seconds} seconds")]
    AccountLocked { retry_after_seconds: i64 },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired verification code")]
    InvalidOrExpiredCode,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Expired token")]
    ExpiredToken,

    #[error("Email is already registered")]
    EmailAlreadyRegistered,

    #[error("Email address has not been verified")]
    EmailNotVerified,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Account is disabled")]
    AccountDisabled,
}

/// Session-token validation and generation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Token signature verification failed")]
    InvalidSignature,

    #[error("Invalid token format")]
    InvalidTokenFormat,

    #[error("Invalid token claims")]
    InvalidClaims,

    #[error("Wrong token type for this operation")]
    WrongTokenType,

    #[error("Token generation failed")]
    TokenGenerationFailed,
}

/// Top-level error for the authentication core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Stable machine-readable code for the error, for API layers that map
    /// errors to response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Auth(e) => match e {
                AuthError::RateLimited { .. } => "RATE_LIMITED",
                AuthError::AccountLocked { .. } => "ACCOUNT_LOCKED",
                AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
                AuthError::InvalidOrExpiredCode => "INVALID_OR_EXPIRED_CODE",
                AuthError::InvalidToken => "INVALID_TOKEN",
                AuthError::ExpiredToken => "EXPIRED_TOKEN",
                AuthError::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
                AuthError::EmailNotVerified => "EMAIL_NOT_VERIFIED",
                AuthError::AccountNotFound => "ACCOUNT_NOT_FOUND",
                AuthError::AccountDisabled => "ACCOUNT_DISABLED",
            },
            CoreError::Token(e) => match e {
                TokenError::TokenExpired => "TOKEN_EXPIRED",
                TokenError::InvalidSignature => "INVALID_SIGNATURE",
                TokenError::InvalidTokenFormat => "INVALID_TOKEN_FORMAT",
                TokenError::InvalidClaims => "INVALID_CLAIMS",
                TokenError::WrongTokenType => "WRONG_TOKEN_TYPE",
                TokenError::TokenGenerationFailed => "TOKEN_GENERATION_FAILED",
            },
            CoreError::Storage { .. } => "STORAGE_ERROR",
            CoreError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller can retry the same operation after waiting.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::Auth(AuthError::RateLimited { .. })
                | CoreError::Auth(AuthError::AccountLocked { .. })
                | CoreError::Storage { .. }
        )
    }
}
