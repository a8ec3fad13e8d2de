use crate::infra::{parse_inventory, AppState};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use carecheck::collaborators::ResponseGenerator;
use carecheck::error::AppError;
use carecheck::screening::{
    classify, screening_router, KeywordCounts, ScreeningService, SessionStore, SliderForm,
    SliderInventory, SliderOutcome, SymptomSignal, TestId,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct ClassifyRequest {
    pub(crate) text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassifyResponse {
    pub(crate) crisis: bool,
    pub(crate) keywords: KeywordCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) test: Option<TestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) display_name: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SliderRequest {
    pub(crate) kind: SliderInventory,
    pub(crate) answers: Vec<u8>,
}

pub(crate) fn with_screening_routes<S, G>(service: Arc<ScreeningService<S, G>>) -> axum::Router
where
    S: SessionStore + 'static,
    G: ResponseGenerator + 'static,
{
    screening_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/classify", axum::routing::post(classify_endpoint))
        .route(
            "/api/v1/assessments/slider",
            axum::routing::post(slider_endpoint),
        )
        .route(
            "/api/v1/assessments/slider/:kind",
            axum::routing::get(slider_form_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn classify_endpoint(Json(payload): Json<ClassifyRequest>) -> Json<ClassifyResponse> {
    let keywords = KeywordCounts::scan(&payload.text);
    let response = match classify(&payload.text) {
        SymptomSignal::Crisis => ClassifyResponse {
            crisis: true,
            keywords,
            test: None,
            display_name: None,
        },
        SymptomSignal::Test(test) => ClassifyResponse {
            crisis: false,
            keywords,
            test: Some(test),
            display_name: Some(test.display_name()),
        },
    };
    Json(response)
}

pub(crate) async fn slider_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<SliderRequest>,
) -> Result<Json<SliderOutcome>, AppError> {
    let outcome = state.slider.assess(payload.kind, &payload.answers)?;
    Ok(Json(outcome))
}

pub(crate) async fn slider_form_endpoint(
    Path(kind): Path<String>,
) -> Result<Json<SliderForm>, (StatusCode, Json<serde_json::Value>)> {
    parse_inventory(&kind)
        .map(|kind| Json(kind.form()))
        .map_err(|error| (StatusCode::NOT_FOUND, Json(json!({ "error": error }))))
}
