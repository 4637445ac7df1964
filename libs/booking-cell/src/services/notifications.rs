// libs/booking-cell/src/services/notifications.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::NotificationRequest;

/// Outbound messaging collaborator (email/SMS). Implementations are
/// best-effort: the engine never waits on them for correctness.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, request: NotificationRequest) -> Result<()>;
}

/// Default sink that records the notification in the log stream. Deployments
/// wire a real mail gateway behind the same trait.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, request: NotificationRequest) -> Result<()> {
        info!(
            "Dispatching {} notification to {} recipient(s)",
            request.event,
            request.recipients.len()
        );
        Ok(())
    }
}

/// Fire-and-forget dispatch. A delivery failure is logged and swallowed; it
/// must never roll back or fail the committed booking.
pub fn dispatch(notifier: Arc<dyn Notifier>, request: NotificationRequest) {
    tokio::spawn(async move {
        let event = request.event;
        if let Err(err) = notifier.notify(request).await {
            warn!("Failed to dispatch {} notification: {:#}", event, err);
        }
    });
}

/// Human-readable slot time used in notification templates.
pub fn format_slot_time(instant: DateTime<Utc>) -> String {
    instant.format("%A, %b %d, %Y at %I:%M %p").to_string()
}
