//! # rhino-panel
//!
//! Live IO dashboard for a remote board. One websocket connection is opened
//! per device endpoint and shared by every display widget; each widget picks
//! out the frames addressed to its signal, and command buttons push actions
//! back over the same connection.
//!
//! The crate also contains the device end of the channel, so the dashboard
//! has something real to talk to.
//!
//! ## Architecture
//!
//! ```text
//! Device (rhino-device)                 Dashboard (rhino-panel)
//!     │                                     │
//!     ├── IoSource (domain/)                ├── ConnectionRegistry (client/)
//!     ├── IoService (service/)              ├── SharedConnection + driver
//!     ├── EventBus (domain/)                ├── Router
//!     ├── REST Handlers (api/)              ├── DisplayWidget / CommandEmitter
//!     └── WS Session (ws/) ◄── /ws ───────► └── Dashboard
//!
//!            {"id": "...", "text": ...}  ──►
//!            ◄──  {"id": 1, "message": "..."}
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod wire;
pub mod ws;
