//! Endpoint → connection registry.
//!
//! The registry is the only place a [`SharedConnection`] is created. It is
//! meant to be built once at startup and injected wherever widgets are
//! mounted, so tests can build their own instead of sharing a global.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_tungstenite::tungstenite::http::Uri;

use super::connection::{ConnectOptions, SharedConnection};
use super::driver;
use crate::error::PanelError;

/// Hands out at most one [`SharedConnection`] per endpoint string.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<String, Arc<SharedConnection>>>,
    opened: AtomicUsize,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `endpoint`, opening a connection on first use.
    ///
    /// Later calls return the existing handle unchanged; their `options`
    /// are ignored. Must be called from inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::InvalidEndpoint`] if `endpoint` is not a
    /// `ws://` or `wss://` URL, and [`PanelError::Internal`] when called
    /// outside a runtime.
    pub fn acquire(
        &self,
        endpoint: &str,
        options: &ConnectOptions,
    ) -> Result<Arc<SharedConnection>, PanelError> {
        let mut connections = self
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = connections.get(endpoint) {
            tracing::debug!(endpoint, "reusing shared connection");
            return Ok(Arc::clone(existing));
        }

        validate_endpoint(endpoint)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| PanelError::Internal(err.to_string()))?;

        let (conn, outbound) = SharedConnection::new(endpoint, options);
        driver::spawn(&runtime, &conn, outbound, options);
        self.opened.fetch_add(1, Ordering::SeqCst);
        tracing::info!(endpoint, "opening shared connection");

        connections.insert(endpoint.to_string(), Arc::clone(&conn));
        Ok(conn)
    }

    /// Number of underlying connections ever opened by this registry.
    #[must_use]
    pub fn opened_connections(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), PanelError> {
    let uri: Uri = endpoint
        .parse()
        .map_err(|_| PanelError::InvalidEndpoint(endpoint.to_string()))?;
    match (uri.scheme_str(), uri.host()) {
        (Some("ws" | "wss"), Some(host)) if !host.is_empty() => Ok(()),
        _ => Err(PanelError::InvalidEndpoint(endpoint.to_string())),
    }
}
