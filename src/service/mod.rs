//! Service layer: orchestrates device IO and update emission.
//!
//! [`IoService`] is the single entry point for sampling the board and
//! applying dashboard commands. It coordinates between the [`IoState`]
//! and the [`EventBus`].
//!
//! [`IoState`]: crate::domain::IoState
//! [`EventBus`]: crate::domain::EventBus

pub mod io_service;

pub use io_service::IoService;
