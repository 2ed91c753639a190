//! Data transfer objects for REST request/response payloads.

pub mod io_dto;

pub use io_dto::CommandResponse;
