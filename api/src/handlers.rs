use crate::estimate_form::EstimateForm;
use crate::page::EstimatePage;
use crate::AppState;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

pub async fn form_page() -> Response {
    EstimatePage::blank().into_response_with(StatusCode::OK)
}

pub async fn estimate(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match EstimateForm::from_multipart(multipart).await {
        Ok(form) => form,
        Err(e) => {
            log::warn!("Unreadable estimate form: {}", e);
            return EstimatePage::with_error(String::new(), e.body_text()).into_response_with(e.status());
        }
    };

    let result = state.estimator.submit(form.document, &form.question).await;
    let (status, page) = EstimatePage::from_result(form.question, result);
    page.into_response_with(status)
}
