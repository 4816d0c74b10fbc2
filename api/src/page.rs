use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use blueprint_estimator::{EstimateError, EstimationResult};

/// The single page of the app. At most one of `warning`, `error` and
/// `estimate` is set.
#[derive(Template, Default)]
#[template(path = "estimate.html")]
pub struct EstimatePage {
    pub question: String,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub estimate: Option<String>,
}

impl EstimatePage {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn with_error(question: String, error: String) -> Self {
        Self {
            question,
            error: Some(error),
            ..Self::default()
        }
    }

    /// Page plus status code for the outcome of one submission.
    pub fn from_result(question: String, result: EstimationResult) -> (StatusCode, Self) {
        match result {
            Ok(text) => (
                StatusCode::OK,
                Self {
                    question,
                    estimate: Some(text),
                    ..Self::default()
                },
            ),
            Err(EstimateError::Validation(message)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Self {
                    question,
                    warning: Some(message),
                    ..Self::default()
                },
            ),
            Err(e @ EstimateError::ExternalCall(_)) => {
                (StatusCode::BAD_GATEWAY, Self::with_error(question, e.to_string()))
            }
            Err(e @ EstimateError::Staging(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Self::with_error(question, e.to_string()),
            ),
        }
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        match self.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                log::error!("Failed to render estimate page: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
        }
    }
}
