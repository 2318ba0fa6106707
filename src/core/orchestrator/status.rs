//! Session status machine and change notification.

use parking_lot::RwLock as SyncRwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use super::events::SessionEvent;

/// The one status value a session is in at any moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Idle,
    Connecting,
    Listening,
    Thinking,
    Speaking,
    Error,
}

/// Holds the current status and broadcasts every transition to the
/// client event channel. Setting the same value twice emits nothing.
pub struct StatusChannel {
    current: SyncRwLock<ConversationStatus>,
    events: mpsc::Sender<SessionEvent>,
}

impl StatusChannel {
    pub fn new(events: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            current: SyncRwLock::new(ConversationStatus::Idle),
            events,
        }
    }

    pub fn get(&self) -> ConversationStatus {
        *self.current.read()
    }

    pub async fn set(&self, next: ConversationStatus) {
        {
            let mut current = self.current.write();
            if *current == next {
                return;
            }
            debug!(from = ?*current, to = ?next, "status transition");
            *current = next;
        }

        if self
            .events
            .send(SessionEvent::Status { status: next })
            .await
            .is_err()
        {
            debug!("event channel closed, dropping status update");
        }
    }
}
