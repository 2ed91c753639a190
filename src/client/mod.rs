//! Dashboard side: one shared connection, many widgets.
//!
//! ```text
//! ConnectionRegistry ──acquire(endpoint)──► Arc<SharedConnection>
//!                                               │  driver task (tokio-tungstenite)
//!                                               ▼
//!                                            Router ──id match──► DisplayWidget(s)
//!
//! CommandEmitter ──send(Command)──► SharedConnection ──► device
//! ```
//!
//! The registry guarantees one connection per endpoint. The router parses
//! each inbound frame once and calls only the widgets registered for its
//! `id`. Widgets unregister when dropped.

pub mod connection;
mod driver;
pub mod dashboard;
pub mod emitter;
pub mod registry;
pub mod router;
pub mod widget;

pub use connection::{ConnectOptions, ConnectionStatus, SharedConnection};
pub use dashboard::{ButtonSpec, Dashboard, DashboardLayout};
pub use emitter::{CommandEmitter, Delivery};
pub use registry::ConnectionRegistry;
pub use router::{DispatchOutcome, Router, Subscription};
pub use widget::{DisplayWidget, WidgetValue};
