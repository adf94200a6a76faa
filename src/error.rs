use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::response::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A handler-level failure with a message safe to show to clients.
    /// The underlying cause is logged, never returned.
    #[error("{message}")]
    Failed {
        message: &'static str,
        #[source]
        source: Box<AppError>,
    },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidCredentials | AppError::Jwt(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Failed { source, .. } => match source.status() {
                status if status.is_server_error() => StatusCode::INTERNAL_SERVER_ERROR,
                status => status,
            },
            AppError::Internal(_) | AppError::Database(_) | AppError::Password(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message exposed in the response envelope.
    fn public_message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Validation(msg) => msg.clone(),
            AppError::Failed { message, source } => {
                if source.status().is_server_error() {
                    (*message).to_string()
                } else {
                    source.public_message()
                }
            }
            AppError::Jwt(_) => "Invalid or expired token".to_string(),
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Internal(_) | AppError::Password(_) => {
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }

    fn log(&self) {
        match self {
            AppError::Database(e) => tracing::error!("Database error: {:?}", e),
            AppError::Internal(e) => tracing::error!("Internal error: {:?}", e),
            AppError::Password(e) => tracing::error!("Password hashing error: {:?}", e),
            AppError::Jwt(e) => tracing::warn!("JWT error: {:?}", e),
            AppError::Failed { message, source } => tracing::error!("{}: {:?}", message, source),
            _ => {}
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        let body: ApiResponse<()> = ApiResponse::error(self.public_message());
        (status, Json(body)).into_response()
    }
}

/// Replace a server-side failure with a client-facing message, keeping the
/// cause for the log. Client errors (401, 404, ...) pass through unchanged.
pub trait ResultExt<T> {
    fn context_msg(self, message: &'static str) -> AppResult<T>;
}

impl<T, E: Into<AppError>> ResultExt<T> for Result<T, E> {
    fn context_msg(self, message: &'static str) -> AppResult<T> {
        self.map_err(|e| {
            let source: AppError = e.into();
            if source.status().is_server_error() {
                AppError::Failed {
                    message,
                    source: Box::new(source),
                }
            } else {
                source
            }
        })
    }
}

pub type AppResult<T> = Result<T, AppError>;
