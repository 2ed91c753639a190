//! Domain layer: signal identity, device IO state and the update bus.
//!
//! The dashboard side only needs [`SignalId`]. The rest models the device
//! that produces the stream: what it measures, how it is sampled, and how
//! updates reach connected sessions.

pub mod event_bus;
pub mod io_source;
pub mod io_state;
pub mod signal_id;

pub use event_bus::EventBus;
pub use io_source::{IoSource, Sample, SimulatedIo};
pub use io_state::{IoSnapshot, IoState, OutputAction};
pub use signal_id::SignalId;
