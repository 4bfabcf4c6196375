//! Messages carried by the live update channel and its WebSocket/SSE transports.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::board::BoardView;

/// SSE event name for board updates, also the WebSocket message type.
pub const UPDATE_BOARD_EVENT: &str = "updateBoard";
/// SSE event name emitted after a maintenance reset.
pub const BOARDS_CLEARED_EVENT: &str = "boardsCleared";

/// Event published on the shared hub.
#[derive(Debug, Clone)]
pub enum BoardEvent {
    /// A board changed (toggle or reset) and this is its new state.
    Updated(BoardView),
    /// Every board was dropped by a maintenance reset.
    Cleared,
}

/// Failures while relaying live messages to a client.
#[derive(Debug, Error)]
pub enum LiveError {
    /// A message could not be serialized.
    #[error("failed to encode live message")]
    Encode(#[from] serde_json::Error),
    /// The client went away.
    #[error("client channel closed")]
    ChannelClosed,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from WebSocket viewers.
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Toggle one of the sender's own cells.
    #[serde(rename = "cellClicked")]
    CellClicked {
        /// Board owner; must match the socket's session.
        username: String,
        /// Cell to flip.
        id: Uuid,
    },
    /// Any other message type, ignored.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize, ToSchema)]
/// Messages pushed to WebSocket viewers.
#[serde(tag = "type")]
pub enum ServerMessage {
    /// New state of one board.
    #[serde(rename = "updateBoard")]
    UpdateBoard(BoardView),
    /// Every board was dropped.
    #[serde(rename = "boardsCleared")]
    BoardsCleared,
    /// A request from this socket failed.
    #[serde(rename = "error")]
    Error {
        /// What went wrong, safe to show to the user.
        message: String,
    },
}

impl ServerMessage {
    /// Report a failed client request back on the socket.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize for a WebSocket text frame.
    pub fn to_json(&self) -> Result<String, LiveError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<BoardEvent> for ServerMessage {
    fn from(event: BoardEvent) -> Self {
        match event {
            BoardEvent::Updated(view) => Self::UpdateBoard(view),
            BoardEvent::Cleared => Self::BoardsCleared,
        }
    }
}

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE `event:` name.
    pub event: Option<String>,
    /// JSON carried in the `data:` field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

impl TryFrom<&BoardEvent> for ServerEvent {
    type Error = LiveError;

    fn try_from(event: &BoardEvent) -> Result<Self, Self::Error> {
        let event = match event {
            BoardEvent::Updated(view) => {
                ServerEvent::json(Some(UPDATE_BOARD_EVENT.to_string()), view)?
            }
            BoardEvent::Cleared => ServerEvent::json(
                Some(BOARDS_CLEARED_EVENT.to_string()),
                &serde_json::json!({}),
            )?,
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn cell_clicked_is_parsed() {
        let id = Uuid::new_v4();
        let raw = json!({ "type": "cellClicked", "username": "alice", "id": id }).to_string();
        match serde_json::from_str::<ClientMessage>(&raw).unwrap() {
            ClientMessage::CellClicked { username, id: parsed } => {
                assert_eq!(username, "alice");
                assert_eq!(parsed, id);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_types_are_tolerated() {
        let message: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(message, ClientMessage::Unknown));
    }

    #[test]
    fn update_board_flattens_the_view() {
        let message = ServerMessage::from(BoardEvent::Updated(BoardView {
            username: "alice".into(),
            bingo_items: vec![],
            has_bingo: true,
        }));
        let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({ "type": "updateBoard", "username": "alice", "bingoItems": [], "hasBingo": true })
        );
    }

    #[test]
    fn sse_events_are_named() {
        let event = ServerEvent::try_from(&BoardEvent::Cleared).unwrap();
        assert_eq!(event.event.as_deref(), Some(BOARDS_CLEARED_EVENT));
        assert_eq!(event.data, "{}");
    }
}
