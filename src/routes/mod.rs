use std::sync::Arc;

use axum::{routing::get, Router};

use crate::error::AppError;
use crate::AppState;

pub mod auth;
pub mod forums;
pub mod health;
pub mod notifications;

/// Routes that need no rate limiting. `/api/auth` is nested separately so the
/// caller can wrap it in a limiter.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Forum routes (public)
        .nest("/api/forums", forums::router())
        // Notification routes (authenticated)
        .nest("/api/notifications", notifications::router())
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

/// Full router without the rate limiter, for exercising handlers in tests.
#[cfg(test)]
pub fn test_router(state: Arc<AppState>) -> Router {
    api_router()
        .nest("/api/auth", auth::router())
        .with_state(state)
}
