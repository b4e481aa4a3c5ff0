//! # Auth Core
//!
//! Authentication and abuse-control core: request rate limiting, escalating
//! account lockout, one-time code lifecycle, and stateless session token
//! issuance. This crate contains domain entities, business services,
//! repository interfaces, and error types; transport, persistence, and real
//! mail delivery plug in behind the traits defined here.
//!
//! All time-dependent behavior flows through the [`clock::Clock`] trait so
//! windows, lockouts, and expirations are deterministic under test.

pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    CodeConfig, LimitPolicy, LockoutConfig, RateLimitConfig, SessionTokenConfig,
};
pub use domain::entities::{
    Account, Claims, CodeKind, OneTimeCode, SessionTokens, TokenType,
};
pub use errors::{AuthError, CoreError, CoreResult, TokenError};
pub use repositories::{AccountStore, CodeStore, InMemoryCodeStore, MockAccountStore};
pub use services::auth::{AuthService, PasswordHasher, Sha256PasswordHasher};
pub use services::codes::CodeService;
pub use services::counter::CounterStore;
pub use services::lockout::{LockoutEngine, LockoutStatus};
pub use services::notify::{Mailer, OutboundMail, RecordingMailer};
pub use services::rate_limit::{
    resolve_client_ip, ClassStatus, LimitClass, RateLimitStatus, RateLimiter,
};
pub use services::session::SessionTokenIssuer;
