//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` and the
//! websocket endpoint `/ws` sit at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI description of the REST endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::system::health_handler,
        handlers::io::get_io,
        handlers::io::post_command,
    ),
    components(schemas(
        crate::wire::Command,
        crate::wire::CommandId,
        crate::domain::IoSnapshot,
        dto::CommandResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "System", description = "Service health"),
        (name = "IO", description = "Device signals and output commands"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the full device application: REST, `/ws`, tracing and CORS.
pub fn build_app(state: AppState) -> Router {
    let router = Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::domain::{EventBus, IoState};
    use crate::service::IoService;

    fn app() -> Router {
        let service = Arc::new(IoService::new(IoState::new(2), EventBus::new(64)));
        build_app(AppState::new(service))
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let Ok(response) = app.oneshot(request).await else {
            panic!("request failed");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        let Ok(request) = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
        else {
            panic!("bad request");
        };
        request
    }

    #[tokio::test]
    async fn health_is_ok() {
        let Ok(request) = Request::get("/health").body(Body::empty()) else {
            panic!("bad request");
        };
        let (status, body) = call(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn io_snapshot_lists_channels() {
        let Ok(request) = Request::get("/api/v1/io").body(Body::empty()) else {
            panic!("bad request");
        };
        let (status, body) = call(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["adc"], serde_json::json!([0, 0]));
        assert_eq!(body["output"], false);
    }

    #[tokio::test]
    async fn command_endpoint_applies_and_rejects() {
        let (status, body) = call(
            app(),
            post_json("/api/v1/commands", r#"{"id":2,"message":"pin_selection_one"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["level"], true);

        let (status, body) = call(
            app(),
            post_json("/api/v1/commands", r#"{"id":9,"message":"pin_selection_one"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1002);

        let (status, _) = call(
            app(),
            post_json("/api/v1/commands", r#"{"id":1,"message":"pin_nine"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn openapi_lists_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/commands"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
