//! Account store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::account::Account;
use crate::errors::CoreError;

/// Persistence interface for accounts.
///
/// The authentication core consumes this as a black box; implementations own
/// the actual storage.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Finds an account by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, CoreError>;

    /// Finds an account by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, CoreError>;

    /// Inserts or updates an account.
    async fn save(&self, account: Account) -> Result<Account, CoreError>;

    /// Whether an account exists for the given email.
    async fn exists_by_email(&self, email: &str) -> Result<bool, CoreError>;
}

/// In-memory account store for tests and single-process use.
pub struct MockAccountStore {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
}

impl MockAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MockAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for MockAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, CoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, CoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }

    async fn save(&self, account: Account) -> Result<Account, CoreError> {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, CoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().any(|a| a.email == email))
    }
}
