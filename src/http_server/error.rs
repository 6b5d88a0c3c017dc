use axum::{
    Json,
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};
use serde::Serialize;

/// Failures a handler reports on purpose, as opposed to unexpected ones.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("No playlist id could be read from `{0}`")]
    InvalidInput(String),
    #[error("Playlist `{0}` not found")]
    NotFound(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,
    pub description: String,
}

fn error_response(status: StatusCode, description: String) -> Response<Body> {
    let body = ErrorBody {
        error: status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
        code: status.as_u16(),
        description,
    };

    (status, Json(body)).into_response()
}

// A generic error report
// Produced via `Err(some_err).wrap_err("Some context")`
// or `Err(color_eyre::eyre::Report::new(SomeError))`
pub struct Report(color_eyre::Report);

impl std::fmt::Debug for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<E> From<E> for Report
where
    E: Into<color_eyre::Report>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Tell axum how to convert `Report` into a response.
impl IntoResponse for Report {
    fn into_response(self) -> Response<Body> {
        let err = self.0;

        if let Some(api_error) = err.downcast_ref::<ApiError>() {
            log::info!("{api_error}");
            return error_response(api_error.status(), api_error.to_string());
        }

        log::error!("{err:?}");

        let from_remote = err
            .chain()
            .any(|cause| cause.downcast_ref::<reqwest::Error>().is_some());

        if from_remote {
            return error_response(
                StatusCode::BAD_GATEWAY,
                "The YouTube API request failed".to_string(),
            );
        }

        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong".to_string(),
        )
    }
}
