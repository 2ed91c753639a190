//! IO handlers: state snapshot and command application.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::CommandResponse;
use crate::app_state::AppState;
use crate::domain::IoSnapshot;
use crate::domain::io_state::OUTPUT_PIN;
use crate::error::{ErrorResponse, PanelError};
use crate::wire::Command;

/// `GET /io`: Current level of every signal.
#[utoipa::path(
    get,
    path = "/api/v1/io",
    tag = "IO",
    summary = "IO snapshot",
    description = "Returns the latest ADC readings, input pin levels and output level.",
    responses(
        (status = 200, description = "Current IO state", body = IoSnapshot),
    )
)]
pub async fn get_io(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.io_service.snapshot().await))
}

/// `POST /commands`: Apply a command, same as sending it over `/ws`.
///
/// # Errors
///
/// Returns [`PanelError`] for unknown command codes or signals.
#[utoipa::path(
    post,
    path = "/api/v1/commands",
    tag = "IO",
    summary = "Apply a command",
    description = "Applies an output command. Code 1 toggles, 2 sets high, 3 sets low; `message` names the output pin.",
    request_body = Command,
    responses(
        (status = 200, description = "Command applied", body = CommandResponse),
        (status = 400, description = "Unknown command code", body = ErrorResponse),
        (status = 404, description = "Unknown output", body = ErrorResponse),
    )
)]
pub async fn post_command(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Result<impl IntoResponse, PanelError> {
    let level = state.io_service.apply_command(&command).await?;
    Ok((
        StatusCode::OK,
        Json(CommandResponse {
            output: OUTPUT_PIN.to_string(),
            level,
        }),
    ))
}

/// IO routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/io", get(get_io))
        .route("/commands", post(post_command))
}
