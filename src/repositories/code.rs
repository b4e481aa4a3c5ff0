//! One-time code store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use constant_time_eq::constant_time_eq;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::one_time_code::{CodeKind, OneTimeCode};
use crate::errors::CoreError;

/// Persistence interface for one-time codes and tokens.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Stores a new code.
    async fn save(&self, code: OneTimeCode) -> Result<(), CoreError>;

    /// Finds the active (unused, unexpired at `now`) code of the given kind
    /// for a subject. The single-active invariant means there is at most one.
    async fn find_active(
        &self,
        email: &str,
        kind: CodeKind,
        now: DateTime<Utc>,
    ) -> Result<Option<OneTimeCode>, CoreError>;

    /// Finds a record by its code value and kind, used or not.
    async fn find_by_code(
        &self,
        code: &str,
        kind: CodeKind,
    ) -> Result<Option<OneTimeCode>, CoreError>;

    /// Marks a record as consumed.
    async fn mark_used(&self, id: Uuid) -> Result<(), CoreError>;

    /// Deletes all unused codes of the given kind for a subject, returning
    /// how many were removed.
    async fn delete_unused(&self, email: &str, kind: CodeKind) -> Result<usize, CoreError>;

    /// Deletes all records past expiry at `now`, returning how many were
    /// removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, CoreError>;
}

/// In-memory code store for tests and single-process use.
pub struct InMemoryCodeStore {
    codes: Arc<RwLock<HashMap<Uuid, OneTimeCode>>>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self {
            codes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored records, expired or not. Operational inspection only.
    pub async fn len(&self) -> usize {
        self.codes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.codes.read().await.is_empty()
    }
}

impl Default for InMemoryCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn save(&self, code: OneTimeCode) -> Result<(), CoreError> {
        let mut codes = self.codes.write().await;
        codes.insert(code.id, code);
        Ok(())
    }

    async fn find_active(
        &self,
        email: &str,
        kind: CodeKind,
        now: DateTime<Utc>,
    ) -> Result<Option<OneTimeCode>, CoreError> {
        let codes = self.codes.read().await;
        Ok(codes
            .values()
            .find(|c| c.email == email && c.kind == kind && c.is_valid(now))
            .cloned())
    }

    async fn find_by_code(
        &self,
        code: &str,
        kind: CodeKind,
    ) -> Result<Option<OneTimeCode>, CoreError> {
        let codes = self.codes.read().await;
        Ok(codes
            .values()
            .find(|c| c.kind == kind && constant_time_eq(c.code.as_bytes(), code.as_bytes()))
            .cloned())
    }

    async fn mark_used(&self, id: Uuid) -> Result<(), CoreError> {
        let mut codes = self.codes.write().await;
        match codes.get_mut(&id) {
            Some(code) => {
                code.mark_used();
                Ok(())
            }
            None => Err(CoreError::Storage {
                message: format!("code record not found: {}", id),
            }),
        }
    }

    async fn delete_unused(&self, email: &str, kind: CodeKind) -> Result<usize, CoreError> {
        let mut codes = self.codes.write().await;
        let before = codes.len();
        codes.retain(|_, c| !(c.email == email && c.kind == kind && !c.is_used));
        Ok(before - codes.len())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, CoreError> {
        let mut codes = self.codes.write().await;
        let before = codes.len();
        codes.retain(|_, c| !c.is_expired(now));
        Ok(before - codes.len())
    }
}
