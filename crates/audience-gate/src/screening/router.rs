use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::warn;

use super::domain::{CheckRequest, CheckResponse, LeadSubmission, ScreeningStatus, SubmissionId};
use super::repository::{ReportStore, StoreError};
use super::service::{ScreeningError, ScreeningService};
use crate::batch::BatchError;
use crate::export::target_rows_csv;
use crate::fetcher::RenderFetcher;

/// Router exposing ad-hoc checks, CSV export, and lead intake.
pub fn screening_router<F, S>(service: Arc<ScreeningService<F, S>>) -> Router
where
    F: RenderFetcher + 'static,
    S: ReportStore + 'static,
{
    Router::new()
        .route("/api/v1/checks", post(check_handler::<F, S>))
        .route("/api/v1/checks/export", post(export_handler::<F, S>))
        .route("/api/v1/leads", post(submit_handler::<F, S>))
        .route("/api/v1/leads/:submission_id", get(status_handler::<F, S>))
        .with_state(service)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, axum::Json(payload)).into_response()
}

fn screening_error_response(error: ScreeningError) -> Response {
    match error {
        ScreeningError::Batch(BatchError::Empty) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, "no targets submitted")
        }
        ScreeningError::Store(StoreError::Conflict) => {
            error_response(StatusCode::CONFLICT, "lead already exists")
        }
        other => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

pub(crate) async fn check_handler<F, S>(
    State(service): State<Arc<ScreeningService<F, S>>>,
    axum::Json(request): axum::Json<CheckRequest>,
) -> Response
where
    F: RenderFetcher + 'static,
    S: ReportStore + 'static,
{
    match service.check_targets(request).await {
        Ok((rows, thresholds)) => {
            let body = CheckResponse::new(&rows, thresholds);
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(error) => screening_error_response(error),
    }
}

pub(crate) async fn export_handler<F, S>(
    State(service): State<Arc<ScreeningService<F, S>>>,
    axum::Json(request): axum::Json<CheckRequest>,
) -> Response
where
    F: RenderFetcher + 'static,
    S: ReportStore + 'static,
{
    let (rows, thresholds) = match service.check_targets(request).await {
        Ok(result) => result,
        Err(error) => return screening_error_response(error),
    };

    match target_rows_csv(&rows, &thresholds) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"audience-check.csv\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}

pub(crate) async fn submit_handler<F, S>(
    State(service): State<Arc<ScreeningService<F, S>>>,
    axum::Json(submission): axum::Json<LeadSubmission>,
) -> Response
where
    F: RenderFetcher + 'static,
    S: ReportStore + 'static,
{
    let record = match service.submit(submission) {
        Ok(record) => record,
        Err(error) => return screening_error_response(error),
    };

    if record.status == ScreeningStatus::Pending {
        let id = record.submission_id.clone();
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if let Err(error) = service.screen(&id).await {
                warn!(submission_id = %id.0, error = %error, "lead screening failed");
            }
        });
    }

    (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response()
}

pub(crate) async fn status_handler<F, S>(
    State(service): State<Arc<ScreeningService<F, S>>>,
    Path(submission_id): Path<String>,
) -> Response
where
    F: RenderFetcher + 'static,
    S: ReportStore + 'static,
{
    let id = SubmissionId(submission_id);
    match service.get(&id) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(ScreeningError::Store(StoreError::NotFound)) => {
            let payload = json!({
                "submission_id": id.0,
                "error": "submission not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}
