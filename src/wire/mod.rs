//! Wire contract shared by the device and the dashboard.
//!
//! Both directions carry JSON text frames over one websocket endpoint.
//! See [`envelope`] for the shapes.

pub mod envelope;

pub use envelope::{Command, CommandId, DEFAULT_VALUE_FIELD, InboundEnvelope, TextUpdate};
