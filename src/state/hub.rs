use tokio::sync::broadcast;

use crate::dto::live::BoardEvent;

/// Single shared topic fanning board updates out to every connected viewer.
///
/// Delivery is fire-and-forget: a subscriber that falls behind the channel
/// capacity skips the events it missed and reconciles through `GET /bingo`.
pub struct BoardHub {
    sender: broadcast::Sender<BoardEvent>,
}

impl BoardHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: BoardEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers (WebSocket and SSE viewers).
    pub fn viewer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
