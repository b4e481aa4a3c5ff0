//! Outbound notification channel.
//!
//! Mail delivery is fire-and-forget from the core's point of view: failures
//! are logged by the caller and never roll back the state change that
//! triggered the notification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// A message handed to the outbound channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound mail channel.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers a message. Errors are advisory; callers log and continue.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// Mailer that records every message instead of delivering it.
///
/// Used in tests and development; `sent()` lets a test fish the delivered
/// code back out, the same way an operator would read it from the logs when
/// real delivery fails.
pub struct RecordingMailer {
    sent: Arc<RwLock<Vec<OutboundMail>>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent send fail, for exercising delivery-failure
    /// paths.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All messages recorded so far.
    pub async fn sent(&self) -> Vec<OutboundMail> {
        self.sent.read().await.clone()
    }

    /// The most recent message addressed to `to`, if any.
    pub async fn last_to(&self, to: &str) -> Option<OutboundMail> {
        self.sent
            .read()
            .await
            .iter()
            .rev()
            .find(|m| m.to == to)
            .cloned()
    }
}

impl Default for RecordingMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("mail channel unavailable".to_string());
        }

        let mut sent = self.sent.write().await;
        sent.push(OutboundMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
