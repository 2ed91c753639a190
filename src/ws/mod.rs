//! WebSocket layer: the device end of the shared channel.
//!
//! The endpoint at `/ws` streams every [`TextUpdate`] to each connected
//! dashboard and accepts [`Command`]s in return.
//!
//! [`TextUpdate`]: crate::wire::TextUpdate
//! [`Command`]: crate::wire::Command

pub mod connection;
pub mod handler;
