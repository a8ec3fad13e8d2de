use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::machine::ScreeningEvent;
use super::repository::{RepositoryError, SessionStore};
use super::service::{ScreeningService, ScreeningServiceError};
use super::session::RunId;
use crate::collaborators::ResponseGenerator;

/// Router exposing run creation, inspection, event dispatch and removal.
pub fn screening_router<S, G>(service: Arc<ScreeningService<S, G>>) -> Router
where
    S: SessionStore + 'static,
    G: ResponseGenerator + 'static,
{
    Router::new()
        .route("/api/v1/screenings", post(create_handler::<S, G>))
        .route(
            "/api/v1/screenings/:run_id",
            get(status_handler::<S, G>).delete(remove_handler::<S, G>),
        )
        .route(
            "/api/v1/screenings/:run_id/events",
            post(event_handler::<S, G>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<S, G>(
    State(service): State<Arc<ScreeningService<S, G>>>,
) -> Response
where
    S: SessionStore + 'static,
    G: ResponseGenerator + 'static,
{
    match service.create().await {
        Ok(reply) => (StatusCode::CREATED, axum::Json(reply)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<S, G>(
    State(service): State<Arc<ScreeningService<S, G>>>,
    Path(run_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: ResponseGenerator + 'static,
{
    match service.get(&RunId(run_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn event_handler<S, G>(
    State(service): State<Arc<ScreeningService<S, G>>>,
    Path(run_id): Path<String>,
    axum::Json(event): axum::Json<ScreeningEvent>,
) -> Response
where
    S: SessionStore + 'static,
    G: ResponseGenerator + 'static,
{
    match service.dispatch(&RunId(run_id), event).await {
        Ok(reply) => (StatusCode::OK, axum::Json(reply)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_handler<S, G>(
    State(service): State<Arc<ScreeningService<S, G>>>,
    Path(run_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: ResponseGenerator + 'static,
{
    match service.remove(&RunId(run_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ScreeningServiceError) -> Response {
    let halted = error.halts_run();
    match error {
        ScreeningServiceError::Screening(error) => {
            let payload = json!({
                "error": error.to_string(),
                "halted": halted,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        ScreeningServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({
                "error": "run not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        ScreeningServiceError::Repository(RepositoryError::Conflict) => {
            let payload = json!({
                "error": "run already exists",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        ScreeningServiceError::Busy(run_id) => {
            let payload = json!({
                "error": format!("run {run_id} is already processing an event"),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
