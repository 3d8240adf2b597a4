//! User Notification Abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A user-visible notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Host-level identifier, unique per notification
    pub id: String,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Host notification channel (system toast, extension notification, ...)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn display(&self, notification: Notification) -> Result<()>;
}
