use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::db::User;
use crate::error::{AppError, AppResult, ResultExt};
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::AppState;

/// Name of the cookie carrying the session JWT.
pub const AUTH_COOKIE: &str = "token";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// ============================================================================
// Handlers
// ============================================================================

/// Exchange email + password for a JWT. The token is returned in the body and
/// also set as an HttpOnly cookie.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<ApiResponse<LoginResponse>>)> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let (token, user) = AuthService::login(&state, &request.email, &request.password)
        .await
        .context_msg("Failed to log in")?;

    let cookie = Cookie::build((AUTH_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(state.config.jwt.expiration_hours))
        .build();

    Ok((
        jar.add(cookie),
        Json(ApiResponse::ok(LoginResponse { token, user })),
    ))
}

/// Clear the session cookie. Succeeds whether or not a session existed.
async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<()>>) {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/").build());
    (jar, Json(ApiResponse::ok(())))
}

/// Get current user info
async fn me(AuthUser(user): AuthUser) -> Json<ApiResponse<User>> {
    Json(ApiResponse::ok(user))
}

// ============================================================================
// Auth Extractor
// ============================================================================

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Extractor for authenticated user
pub struct AuthUser(pub User);

/// Bearer token from the Authorization header, falling back to the auth cookie
/// when the header is absent or uses another scheme.
fn token_from_parts(parts: &Parts) -> Option<String> {
    if let Some(header) = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        match header.get(..7) {
            Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => {
                let token = header[7..].trim();
                return (!token.is_empty()).then(|| token.to_string());
            }
            _ => tracing::debug!("Authorization header is not a bearer token, trying cookie"),
        }
    }

    CookieJar::from_headers(&parts.headers)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or_else(|| {
            tracing::debug!("No session token on request");
            AppError::Unauthorized
        })?;

        let user = AuthService::get_user_from_token(state, &token)
            .await
            .map_err(|e| match e {
                // Lookup failures are server errors; everything else means "not signed in".
                e @ (AppError::Database(_) | AppError::Internal(_)) => e,
                other => {
                    tracing::debug!("Failed to get user from token: {:?}", other);
                    AppError::Unauthorized
                }
            })?;

        tracing::debug!("Authenticated user: {}", user.id);
        Ok(AuthUser(user))
    }
}
