//! HTTP routes: the dispatcher between the host server and the gateway.
//!
//! Everything that is not `/health` falls through to the script handler,
//! which serves `.sml`/`.msp` requests via the gateway pipeline and maps
//! outcomes to responses:
//!
//! - `Completed` → 200 with the engine's own output
//! - `SourceNotFound` → 404
//! - `NotReady` → 200 with a fixed "temporarily out of service" page
//!   (a broken build degrades gracefully rather than exposing an error)
//! - internal pipeline failure → the trap script, the global error handler

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;

use smlgate_core::{Engine, Outcome, ScriptGateway};

/// Request-path extensions served by the gateway.
pub const SERVED_EXTENSIONS: [&str; 2] = [".sml", ".msp"];

const OUT_OF_SERVICE_BODY: &str = "<html><head>\
<title>The web service is temporarily out of service</title></head>\
<body><h2>The web service is temporarily out of service</h2>\
Please come back later!</body></html>";

/// Application state shared across handlers.
pub struct AppState<E: Engine> {
    /// The single gateway instance every request funnels through.
    pub gateway: Arc<ScriptGateway<E>>,
    /// Request path of the trap script.
    pub trap_path: String,
}

/// Create the router with all routes.
pub fn create_router<E: Engine + 'static>(state: Arc<AppState<E>>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback(script_handler::<E>)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Serve a script request.
async fn script_handler<E: Engine + 'static>(
    State(state): State<Arc<AppState<E>>>,
    request: Request<Body>,
) -> Response {
    if !matches!(*request.method(), Method::GET | Method::POST) {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = request.uri().path().to_string();
    if !is_script_path(&path) {
        return StatusCode::NOT_FOUND.into_response();
    }

    run_script(&state, path).await
}

/// Run one path through the gateway and build the response. Internal
/// pipeline failures re-enter the gateway on the trap script.
async fn run_script<E: Engine + 'static>(state: &Arc<AppState<E>>, path: String) -> Response {
    match run_blocking(state.gateway.clone(), path.clone()).await {
        Ok(outcome) => {
            tracing::debug!(path = %path, outcome = outcome.label(), "request served");
            outcome_response(outcome)
        }
        Err(e) => {
            tracing::error!(path = %path, error = %e, "pipeline failure, running trap script");
            trap_response(state).await
        }
    }
}

/// The trap entry point: one more script execution acting as the global
/// error handler. If the trap itself cannot complete, give up with a 500.
async fn trap_response<E: Engine + 'static>(state: &Arc<AppState<E>>) -> Response {
    match run_blocking(state.gateway.clone(), state.trap_path.clone()).await {
        Ok(Outcome::Completed(body)) => html_response(StatusCode::OK, body),
        Ok(other) => {
            tracing::error!(trap = %state.trap_path, outcome = other.label(), "trap script unavailable");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            tracing::error!(trap = %state.trap_path, error = %e, "trap script failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Gateway runs do synchronous file and subprocess work, so they go
/// through the blocking pool instead of stalling the runtime.
async fn run_blocking<E: Engine + 'static>(
    gateway: Arc<ScriptGateway<E>>,
    path: String,
) -> smlgate_core::Result<Outcome> {
    match tokio::task::spawn_blocking(move || gateway.run(&path)).await {
        Ok(result) => result,
        Err(e) => Err(smlgate_core::Error::Engine(format!("task join error: {e}"))),
    }
}

/// Map a pipeline outcome to a host response.
pub fn outcome_response(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Completed(body) => html_response(StatusCode::OK, body),
        Outcome::SourceNotFound => StatusCode::NOT_FOUND.into_response(),
        Outcome::NotReady(_) => {
            html_response(StatusCode::OK, OUT_OF_SERVICE_BODY.as_bytes().to_vec())
        }
    }
}

fn html_response(status: StatusCode, body: Vec<u8>) -> Response {
    (status, [(header::CONTENT_TYPE, "text/html")], body).into_response()
}

fn is_script_path(path: &str) -> bool {
    SERVED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smlgate_core::NotReadyReason;

    #[test]
    fn script_paths_are_recognized() {
        assert!(is_script_path("/a.sml"));
        assert!(is_script_path("/deep/dir/page.msp"));
        assert!(!is_script_path("/style.css"));
        assert!(!is_script_path("/a.sml.txt"));
    }

    #[test]
    fn completed_serves_engine_output() {
        let response = outcome_response(Outcome::Completed(b"<p>hi</p>".to_vec()));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn source_not_found_is_404() {
        let response = outcome_response(Outcome::SourceNotFound);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn not_ready_is_a_soft_200() {
        let response = outcome_response(Outcome::NotReady(NotReadyReason::MissingMarker));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
