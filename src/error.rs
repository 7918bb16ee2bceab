use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

pub type GenerationResult<T> = Result<T, GenerationError>;

/// Every failure the generate/serve pipeline can surface to a client.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Configuration(String),

    #[error("Error generating video: {0}")]
    Inference(String),

    #[error("No output received from the inference provider")]
    EmptyResult,

    #[error("Failed to download generated video: {0}")]
    Download(String),

    #[error("Request timeout - {0}")]
    Timeout(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Filesystem error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ResponseError for GenerationError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenerationError::Validation(_) => StatusCode::BAD_REQUEST,
            GenerationError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            GenerationError::NotFound(_) => StatusCode::NOT_FOUND,
            GenerationError::Configuration(_)
            | GenerationError::Inference(_)
            | GenerationError::EmptyResult
            | GenerationError::Download(_)
            | GenerationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() }))
    }
}
