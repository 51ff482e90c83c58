use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use loan_review::origination::{
    origination_router, ApplicationStore, BorrowerStore, DocumentStore, LoanOrigination,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReadinessResponse {
    pub(crate) status: &'static str,
    pub(crate) scoring_attached: bool,
    pub(crate) checked_at: DateTime<Utc>,
}

pub(crate) fn with_service_routes<A, B, D>(
    origination: Arc<LoanOrigination<A, B, D>>,
) -> axum::Router
where
    A: ApplicationStore + 'static,
    B: BorrowerStore + 'static,
    D: DocumentStore + 'static,
{
    origination_router(origination)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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

    let payload = ReadinessResponse {
        status: if ready { "ready" } else { "initializing" },
        scoring_attached: state.scoring_attached,
        checked_at: Utc::now(),
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
