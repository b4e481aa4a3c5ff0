//! Account entity as exposed by the external account store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
///
/// The authentication core treats the account store as an external
/// collaborator; this is the minimal shape it needs: identity, credentials,
/// and verification state. Lockout counters live in the in-process
/// [`LockoutEngine`](crate::services::lockout::LockoutEngine), but the
/// persisted fields are carried here so a durable store can mirror them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account
    pub id: Uuid,

    /// Email address, the login identity
    pub email: String,

    /// One-way hash of the password
    pub password_hash: String,

    /// Whether the email address has been verified
    pub email_verified: bool,

    /// Failed login attempts since the last success
    pub failed_login_attempts: u32,

    /// End of the current lockout, if any
    pub locked_until: Option<DateTime<Utc>>,

    /// Whether the account may authenticate at all
    pub is_active: bool,

    /// Timestamp when the account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new, unverified account.
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            email_verified: false,
            failed_login_attempts: 0,
            locked_until: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the email address as verified.
    pub fn mark_verified(&mut self) {
        self.email_verified = true;
        self.updated_at = Utc::now();
    }

    /// Replaces the password hash.
    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }

    /// Disables the account.
    pub fn disable(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    /// Re-enables the account.
    pub fn enable(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }
}
