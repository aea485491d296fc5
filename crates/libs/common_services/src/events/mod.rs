use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Album membership changes that collaborators are told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AlbumEvent {
    /// `user_id` was added as a collaborator.
    #[serde(rename_all = "camelCase")]
    AlbumInvite { album_id: String, user_id: String },
    /// Assets were added to the album.
    #[serde(rename_all = "camelCase")]
    AlbumUpdate {
        album_id: String,
        recipient_id: String,
    },
}

/// Fire-and-forget sink for album events.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: AlbumEvent);
}

/// Publishes events on a tokio broadcast channel.
#[derive(Clone)]
pub struct BroadcastEmitter {
    sender: broadcast::Sender<AlbumEvent>,
}

impl BroadcastEmitter {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AlbumEvent> {
        self.sender.subscribe()
    }
}

impl EventEmitter for BroadcastEmitter {
    fn emit(&self, event: AlbumEvent) {
        if let Err(err) = self.sender.send(event) {
            debug!("No listeners for album event: {:?}", err.0);
        }
    }
}
