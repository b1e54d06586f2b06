//! One-shot notifications carried across a redirect.

use tower_sessions::Session;

use crate::gateway::Notification;
use crate::models::session_keys;

/// Store a notification to show on the next rendered page.
pub async fn set_flash(session: &Session, notification: &Notification) {
    if let Err(e) = session.insert(session_keys::FLASH, notification).await {
        tracing::warn!(error = %e, "Failed to store flash notification");
    }
}

/// Take the pending notification, if any.
pub async fn take_flash(session: &Session) -> Option<Notification> {
    session
        .remove::<Notification>(session_keys::FLASH)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read flash notification");
            None
        })
}
