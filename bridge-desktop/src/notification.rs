//! Notification sink for hosts without a native notification surface

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    notification::{Notification, Notifier},
};
use tracing::info;

/// Writes notifications to the log instead of displaying them
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn display(&self, notification: Notification) -> Result<()> {
        info!(
            id = %notification.id,
            title = %notification.title,
            "{}",
            notification.body
        );
        Ok(())
    }
}
