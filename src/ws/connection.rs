//! WebSocket session state machine.
//!
//! Handles the read/write loop for a single dashboard session: forwards
//! every bus update (no per-session filtering, the dashboard routes) and
//! applies incoming commands.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::service::IoService;
use crate::wire::{Command, TextUpdate};

/// Runs the read/write loop for a single websocket session.
///
/// - Sends the current value of every signal first, so a fresh dashboard
///   is populated without waiting for the next sample.
/// - Forwards updates from the [`broadcast::Receiver`] to the client.
/// - Reads commands from the client and applies them. Bad commands are
///   logged; they never close the session.
pub async fn run_session(
    socket: WebSocket,
    event_rx: broadcast::Receiver<TextUpdate>,
    io_service: Arc<IoService>,
) {
    let session = uuid::Uuid::new_v4();
    let span = tracing::info_span!("ws_session", %session);
    session_loop(socket, event_rx, io_service)
        .instrument(span)
        .await;
}

async fn session_loop(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<TextUpdate>,
    io_service: Arc<IoService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    tracing::info!("dashboard connected");

    for update in io_service.readings().await {
        if !forward(&mut ws_tx, &update).await {
            return;
        }
    }

    loop {
        tokio::select! {
            // Incoming message from the dashboard
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => handle_command(&text, &io_service).await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Update from the EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(update) => {
                        if !forward(&mut ws_tx, &update).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::info!("dashboard disconnected");
}

/// Sends one update. Returns `false` once the socket is unusable.
async fn forward(ws_tx: &mut SplitSink<WebSocket, Message>, update: &TextUpdate) -> bool {
    let json = match update.to_json() {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(signal = %update.id, error = %err, "skipping unserializable update");
            return true;
        }
    };
    ws_tx.send(Message::text(json)).await.is_ok()
}

async fn handle_command(text: &str, io_service: &IoService) {
    let command = match Command::parse(text) {
        Ok(command) => command,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring malformed command");
            return;
        }
    };
    if let Err(err) = io_service.apply_command(&command).await {
        tracing::warn!(
            command = %command.id,
            payload = %command.message,
            error = %err,
            "command rejected"
        );
    }
}
