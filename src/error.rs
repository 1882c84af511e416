use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("upload error: {0}")]
    Multipart(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        if matches!(
            self,
            ApiError::Database(_) | ApiError::Pool(_) | ApiError::Storage(_) | ApiError::Internal(_)
        ) {
            log::error!("{}", self);
        }
        let mut builder = match self {
            ApiError::Validation(_) | ApiError::Multipart(_) => HttpResponse::BadRequest(),
            ApiError::Unauthorized => HttpResponse::Unauthorized(),
            ApiError::NotFound(_) => HttpResponse::NotFound(),
            ApiError::Conflict(_) => HttpResponse::Conflict(),
            ApiError::Database(diesel::result::Error::NotFound) => HttpResponse::NotFound(),
            ApiError::Database(_)
            | ApiError::Pool(_)
            | ApiError::Storage(_)
            | ApiError::Internal(_) => HttpResponse::InternalServerError(),
        };
        builder.json(json!({ "error": self.to_string() }))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
