//! The shared connection handle.
//!
//! One [`SharedConnection`] exists per endpoint. Every widget and emitter on
//! the dashboard holds an `Arc` to the same handle. The handle only carries
//! transport concerns (status, last frame, outbound queue); addressing is the
//! [`Router`]'s job.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::router::{DispatchOutcome, Router};
use crate::error::PanelError;
use crate::wire::{Command, DEFAULT_VALUE_FIELD};

type OpenCallback = Box<dyn Fn(u64) + Send + Sync>;

/// Transport status as seen by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// A connect attempt is in flight.
    Connecting,
    /// Frames flow both ways.
    Open,
    /// The last attempt failed or the socket closed. A retry is scheduled.
    Closed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

/// Options fixed by the first `acquire` of an endpoint.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Inbound field holding the displayed value.
    pub value_field: String,
    /// First reconnect delay.
    pub reconnect_min: Duration,
    /// Reconnect delay ceiling.
    pub reconnect_max: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            value_field: DEFAULT_VALUE_FIELD.to_string(),
            reconnect_min: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(10),
        }
    }
}

/// A command waiting for the driver, stamped with the epoch of the
/// connection it was accepted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Outbound {
    pub(crate) epoch: u64,
    pub(crate) raw: String,
}

impl Outbound {
    /// Only the connection a frame was accepted on may write it.
    pub(crate) fn belongs_to(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }
}

/// Handle to the one live connection for an endpoint.
///
/// Outbound delivery is at-most-once: [`send`](Self::send) refuses while the
/// connection is not open, and nothing is replayed after a reconnect.
pub struct SharedConnection {
    endpoint: String,
    router: Router,
    status: watch::Sender<ConnectionStatus>,
    last_received: watch::Sender<Option<Arc<str>>>,
    outbound: mpsc::UnboundedSender<Outbound>,
    open_callbacks: Mutex<Vec<OpenCallback>>,
    epoch: AtomicU64,
}

impl SharedConnection {
    /// Creates a handle in the `Connecting` state together with the
    /// receiving end of its outbound queue. The driver owns the receiver.
    pub(crate) fn new(
        endpoint: &str,
        options: &ConnectOptions,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Outbound>) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(ConnectionStatus::Connecting);
        let (last_received, _) = watch::channel(None);
        let conn = Arc::new(Self {
            endpoint: endpoint.to_string(),
            router: Router::new(&options.value_field),
            status,
            last_received,
            outbound,
            open_callbacks: Mutex::new(Vec::new()),
            epoch: AtomicU64::new(0),
        });
        (conn, outbound_rx)
    }

    /// Endpoint URL this handle is bound to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Dispatcher that widgets register with.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Current transport status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Observable status for callers that want to react to changes.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Number of times the connection has been established so far.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Most recent raw inbound frame. Identical for every observer.
    #[must_use]
    pub fn last_received(&self) -> Option<Arc<str>> {
        self.last_received.borrow().clone()
    }

    /// Registers `callback` to run on every connection establishment.
    ///
    /// If the connection is already open, `callback` also runs right away
    /// with the current epoch. It must not call `on_open` itself.
    pub fn on_open<F>(&self, callback: F)
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        let mut callbacks = self
            .open_callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.status() == ConnectionStatus::Open {
            callback(self.epoch());
        }
        callbacks.push(Box::new(callback));
    }

    /// Resolves once the connection is open.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::ConnectionLost`] if the status channel is gone,
    /// which cannot happen while `self` is alive.
    pub async fn wait_open(&self) -> Result<(), PanelError> {
        let mut rx = self.status.subscribe();
        rx.wait_for(|status| *status == ConnectionStatus::Open)
            .await
            .map(|_| ())
            .map_err(|err| PanelError::ConnectionLost(err.to_string()))
    }

    /// Hands `command` to the transport.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::SendBeforeOpen`] when the connection is not
    /// open; the command is dropped, not queued. Returns
    /// [`PanelError::ConnectionLost`] if the driver has stopped.
    ///
    /// A command accepted just before the socket dies is discarded by the
    /// driver; it is never written on a later connection.
    pub fn send(&self, command: &Command) -> Result<(), PanelError> {
        let epoch = self.admit(command)?;
        let raw = command.to_json()?;
        self.enqueue(Outbound { epoch, raw })
    }

    /// Epoch a command sent now belongs to. The epoch is read before the
    /// status: a reconnect in between makes the frame stale instead of
    /// moving it onto the new connection.
    pub(crate) fn admit(&self, command: &Command) -> Result<u64, PanelError> {
        let epoch = self.epoch();
        if self.status() != ConnectionStatus::Open {
            tracing::debug!(endpoint = %self.endpoint, command = %command.id, "send before open");
            return Err(PanelError::SendBeforeOpen);
        }
        Ok(epoch)
    }

    pub(crate) fn enqueue(&self, frame: Outbound) -> Result<(), PanelError> {
        self.outbound
            .send(frame)
            .map_err(|_| PanelError::ConnectionLost("driver stopped".to_string()))
    }

    pub(crate) fn mark_connecting(&self) {
        self.status.send_replace(ConnectionStatus::Connecting);
    }

    pub(crate) fn mark_open(&self) {
        let callbacks = self
            .open_callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.status.send_replace(ConnectionStatus::Open);
        tracing::info!(endpoint = %self.endpoint, epoch, "connection open");
        for callback in callbacks.iter() {
            callback(epoch);
        }
    }

    pub(crate) fn mark_closed(&self) {
        let previous = self.status.send_replace(ConnectionStatus::Closed);
        if previous == ConnectionStatus::Open {
            tracing::warn!(endpoint = %self.endpoint, "connection closed");
        }
    }

    /// Publishes `raw` as the last received frame, then routes it.
    pub(crate) fn receive(&self, raw: &str) -> DispatchOutcome {
        self.last_received.send_replace(Some(Arc::from(raw)));
        self.router.dispatch(raw)
    }
}

impl fmt::Debug for SharedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedConnection")
            .field("endpoint", &self.endpoint)
            .field("status", &self.status())
            .field("epoch", &self.epoch())
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}
