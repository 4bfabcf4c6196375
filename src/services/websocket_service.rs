use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        mpsc,
    },
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{
    dto::live::{BoardEvent, ClientMessage, LiveError, ServerMessage},
    error::AppError,
    services::board_service,
    state::{SharedState, session::Session},
};

/// Handle the full lifecycle of an authenticated viewer WebSocket.
///
/// The socket receives every hub event and may toggle the viewer's own cells
/// with `cellClicked` messages.
pub async fn handle_socket(state: SharedState, socket: WebSocket, session: Session) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let forwarder_task = tokio::spawn(forward_hub_events(
        state.hub().subscribe(),
        outbound_tx.clone(),
    ));

    let username = session.username.clone();
    info!(username = %username, "viewer connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let reply = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(ClientMessage::CellClicked { username: target, id }) => {
                        if target != username {
                            warn!(username = %username, target = %target, "cellClicked for another user's board");
                            Some(ServerMessage::error("you can only toggle your own board"))
                        } else {
                            match board_service::toggle_and_broadcast(&state, &username, id).await {
                                // the update itself reaches this socket through the hub
                                Ok(_) => None,
                                Err(err) => {
                                    err.log_failure("ws_toggle", &username);
                                    Some(ServerMessage::error(AppError::from(err).to_string()))
                                }
                            }
                        }
                    }
                    Ok(ClientMessage::Unknown) => {
                        warn!(username = %username, payload = %text.as_str(), "ignoring unknown message type");
                        None
                    }
                    Err(err) => {
                        warn!(username = %username, error = %err, "failed to parse viewer message");
                        Some(ServerMessage::error("malformed message"))
                    }
                };

                if let Some(reply) = reply {
                    if let Err(err) = send_message(&outbound_tx, &reply) {
                        warn!(username = %username, error = %err, "connection closed while replying");
                        break;
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(username = %username, "viewer closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(username = %username, error = %err, "websocket error");
                break;
            }
        }
    }

    forwarder_task.abort();
    let _ = forwarder_task.await;
    info!(username = %username, "viewer disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Relay hub events to one socket until either side goes away.
async fn forward_hub_events(
    mut receiver: broadcast::Receiver<BoardEvent>,
    outbound_tx: mpsc::UnboundedSender<Message>,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                if let Err(err) = send_message(&outbound_tx, &ServerMessage::from(event)) {
                    if matches!(err, LiveError::ChannelClosed) {
                        break;
                    }
                    warn!(error = %err, "dropping live message");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "websocket viewer lagging behind board updates");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn send_message(
    outbound_tx: &mpsc::UnboundedSender<Message>,
    message: &ServerMessage,
) -> Result<(), LiveError> {
    let json = message.to_json()?;
    outbound_tx
        .send(Message::Text(json.into()))
        .map_err(|_| LiveError::ChannelClosed)
}

async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
