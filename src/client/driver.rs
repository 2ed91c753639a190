//! Transport task behind a [`SharedConnection`].
//!
//! Connects with `tokio-tungstenite`, reads frames one at a time and routes
//! each one completely before reading the next, and writes queued commands
//! in the order they were sent. On failure it marks the handle closed,
//! throws away unwritten commands and reconnects with exponential backoff.
//!
//! The task only holds a `Weak` reference to its handle. Once the last
//! `Arc<SharedConnection>` is gone the outbound queue closes and the task
//! shuts the socket and exits.

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::connection::{ConnectOptions, Outbound, SharedConnection};
use crate::error::PanelError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Shortest delay between connect attempts.
const MIN_BACKOFF: Duration = Duration::from_millis(1);

/// Spawns the connect/read/write loop for `conn` on `runtime`.
pub(crate) fn spawn(
    runtime: &tokio::runtime::Handle,
    conn: &Arc<SharedConnection>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    options: &ConnectOptions,
) -> JoinHandle<()> {
    let (min, max) = backoff_bounds(options);
    let endpoint = conn.endpoint().to_string();
    runtime.spawn(run(Arc::downgrade(conn), endpoint, outbound, min, max))
}

/// Reconnect delay range. A zero minimum would never grow.
fn backoff_bounds(options: &ConnectOptions) -> (Duration, Duration) {
    let min = options.reconnect_min.max(MIN_BACKOFF);
    (min, options.reconnect_max.max(min))
}

async fn run(
    conn: Weak<SharedConnection>,
    endpoint: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    min: Duration,
    max: Duration,
) {
    let mut backoff = min;
    loop {
        match conn.upgrade() {
            Some(handle) => handle.mark_connecting(),
            None => break,
        }
        match connect_async(endpoint.as_str()).await {
            Ok((socket, _)) => {
                let Some(handle) = conn.upgrade() else {
                    break;
                };
                backoff = min;
                handle.mark_open();
                let epoch = handle.epoch();
                drop(handle);

                let err = pump(&conn, epoch, socket, &mut outbound).await;
                tracing::warn!(%endpoint, epoch, error = %err, "connection lost");
            }
            Err(err) => {
                tracing::warn!(
                    %endpoint,
                    error = %err,
                    retry_ms = backoff.as_millis(),
                    "connect failed"
                );
            }
        }
        match conn.upgrade() {
            Some(handle) => handle.mark_closed(),
            None => break,
        }
        discard_unwritten(&mut outbound);

        tokio::time::sleep(backoff).await;
        backoff = backoff.saturating_mul(2).min(max);
    }
    tracing::debug!(%endpoint, "connection handle dropped, driver stopped");
}

/// Moves frames both ways until the socket fails or the handle is dropped.
async fn pump(
    conn: &Weak<SharedConnection>,
    epoch: u64,
    socket: Socket,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
) -> PanelError {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let Some(handle) = conn.upgrade() else {
                            let _ = ws_tx.close().await;
                            return PanelError::ConnectionLost("handle dropped".to_string());
                        };
                        let outcome = handle.receive(text.as_str());
                        tracing::trace!(?outcome, "frame routed");
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return PanelError::ConnectionLost("closed by peer".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return PanelError::ConnectionLost(err.to_string()),
                }
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    let _ = ws_tx.close().await;
                    return PanelError::ConnectionLost("handle dropped".to_string());
                };
                if !frame.belongs_to(epoch) {
                    tracing::warn!(
                        epoch,
                        stale = frame.epoch,
                        "discarded command from an earlier connection"
                    );
                } else if let Err(err) = ws_tx.send(Message::text(frame.raw)).await {
                    return PanelError::ConnectionLost(err.to_string());
                }
            }
        }
    }
}

fn discard_unwritten(outbound: &mut mpsc::UnboundedReceiver<Outbound>) {
    let mut dropped = 0usize;
    while outbound.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        tracing::warn!(dropped, "discarded commands queued on a dead connection");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    use crate::client::connection::ConnectionStatus;
    use crate::wire::Command;

    const WAIT: Duration = Duration::from_secs(5);

    async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
        let Ok(Ok((stream, _))) = timeout(WAIT, listener.accept()).await else {
            panic!("no connection");
        };
        let Ok(socket) = tokio_tungstenite::accept_async(stream).await else {
            panic!("handshake failed");
        };
        socket
    }

    fn fast() -> ConnectOptions {
        ConnectOptions {
            reconnect_min: Duration::from_millis(10),
            reconnect_max: Duration::from_millis(40),
            ..ConnectOptions::default()
        }
    }

    #[test]
    fn zero_minimum_backoff_still_grows() {
        let options = ConnectOptions {
            reconnect_min: Duration::ZERO,
            reconnect_max: Duration::ZERO,
            ..ConnectOptions::default()
        };
        let (min, max) = backoff_bounds(&options);
        assert_eq!(min, MIN_BACKOFF);
        assert_eq!(max, MIN_BACKOFF);
        assert!(min.saturating_mul(2) > Duration::ZERO);
    }

    #[test]
    fn maximum_never_below_minimum() {
        let options = ConnectOptions {
            reconnect_min: Duration::from_secs(2),
            reconnect_max: Duration::from_secs(1),
            ..ConnectOptions::default()
        };
        assert_eq!(
            backoff_bounds(&options),
            (Duration::from_secs(2), Duration::from_secs(2))
        );
    }

    #[tokio::test]
    async fn driver_exits_once_the_handle_is_dropped() {
        let Ok(reserved) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = reserved.local_addr() else {
            panic!("no local addr");
        };
        drop(reserved);

        let (conn, outbound) = SharedConnection::new(&format!("ws://{addr}/ws"), &fast());
        let task = spawn(&tokio::runtime::Handle::current(), &conn, outbound, &fast());
        let mut status = conn.watch_status();
        let closed = timeout(WAIT, status.wait_for(|s| *s == ConnectionStatus::Closed)).await;
        assert!(closed.is_ok_and(|r| r.is_ok()));

        drop(status);
        drop(conn);
        assert!(timeout(WAIT, task).await.is_ok_and(|r| r.is_ok()));
    }

    #[tokio::test]
    async fn stale_command_is_not_written_after_reconnect() {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        let (conn, outbound) = SharedConnection::new(&format!("ws://{addr}/ws"), &fast());
        let _task = spawn(&tokio::runtime::Handle::current(), &conn, outbound, &fast());

        let mut first = accept(&listener).await;
        let Ok(Ok(())) = timeout(WAIT, conn.wait_open()).await else {
            panic!("never opened");
        };
        let stale = Command::code(1, "pin_selection_one");
        let Ok(epoch) = conn.admit(&stale) else {
            panic!("open connection refused the command");
        };
        let _ = first.close(None).await;
        drop(first);

        let mut second = accept(&listener).await;
        let mut status = conn.watch_status();
        let reopened = timeout(WAIT, status.wait_for(|_| conn.epoch() == 2)).await;
        assert!(reopened.is_ok_and(|r| r.is_ok()));

        // Enqueued late, as a sender racing the reconnect would.
        let Ok(raw) = stale.to_json() else {
            panic!("serialization failed");
        };
        assert!(conn.enqueue(Outbound { epoch, raw }).is_ok());
        assert!(conn.send(&Command::code(3, "pin_selection_one")).is_ok());

        let Ok(Some(Ok(Message::Text(text)))) = timeout(WAIT, second.next()).await else {
            panic!("nothing written on the new connection");
        };
        assert_eq!(
            Command::parse(text.as_str()),
            Ok(Command::code(3, "pin_selection_one"))
        );
    }
}
