//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::IoService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// IO service for sampling and commands.
    pub io_service: Arc<IoService>,
    /// Event bus for websocket sessions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Builds state around `io_service`, sharing its bus.
    #[must_use]
    pub fn new(io_service: Arc<IoService>) -> Self {
        let event_bus = io_service.event_bus().clone();
        Self {
            io_service,
            event_bus,
        }
    }
}
