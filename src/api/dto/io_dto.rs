//! DTOs for the IO endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// Response body for `POST /api/v1/commands`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommandResponse {
    /// Output pin the command was applied to.
    pub output: String,
    /// Output level after the command.
    pub level: bool,
}
