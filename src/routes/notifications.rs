use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{Notification, NotificationRepository};
use crate::error::{AppError, AppResult, ResultExt};
use crate::response::ApiResponse;
use crate::routes::auth::AuthUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/:id/read", post(mark_read))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationsListResponse {
    pub items: Vec<Notification>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// List notifications for the current user, newest first
async fn list_notifications(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<Json<ApiResponse<NotificationsListResponse>>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1)
        .checked_mul(per_page)
        .ok_or_else(|| AppError::BadRequest("Page is out of range".to_string()))?;

    let (items, total) = tokio::try_join!(
        NotificationRepository::find_by_user_id(
            &state.db,
            &user.id,
            query.unread_only,
            per_page,
            offset,
        ),
        NotificationRepository::count_by_user_id(&state.db, &user.id, query.unread_only),
    )
    .context_msg("Failed to fetch notifications")?;

    let total_pages = (total + per_page - 1) / per_page;

    Ok(Json(ApiResponse::ok(NotificationsListResponse {
        items,
        total,
        page,
        per_page,
        total_pages,
    })))
}

/// Number of unread notifications for the current user
async fn unread_count(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<CountResponse>>> {
    let count = NotificationRepository::count_unread(&state.db, &user.id)
        .await
        .context_msg("Failed to fetch notification count")?;

    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// Mark all of the current user's notifications as read
async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let updated = NotificationRepository::mark_all_read(&state.db, &user.id)
        .await
        .context_msg("Failed to mark notifications as read")?;

    tracing::debug!("Marked {} notifications read for user {}", updated, user.id);
    Ok(Json(ApiResponse::ok(MarkAllReadResponse { updated })))
}

/// Mark a single notification as read. Notifications of other users are
/// reported as not found.
async fn mark_read(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let notification = NotificationRepository::find_for_user(&state.db, &id, &user.id)
        .await
        .context_msg("Failed to mark notification as read")?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    if notification.is_read {
        return Ok(Json(ApiResponse::ok(notification)));
    }

    let updated = NotificationRepository::mark_read(&state.db, &notification.id)
        .await
        .context_msg("Failed to mark notification as read")?;

    Ok(Json(ApiResponse::ok(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_router;
    use crate::services::auth::AuthService;
    use crate::test_support::{create_notification, create_user, test_state};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        token: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = test_router(state.clone())
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn notification_endpoints_require_authentication() {
        let state = test_state().await;
        for (method, uri) in [
            (Method::GET, "/api/notifications/count"),
            (Method::POST, "/api/notifications/read-all"),
            (Method::GET, "/api/notifications"),
            (Method::POST, "/api/notifications/abc/read"),
        ] {
            let (status, body) = send(&state, method, uri, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "Authentication required");
        }
    }

    #[tokio::test]
    async fn count_only_includes_own_unread() {
        let state = test_state().await;
        let alice = create_user(&state.db, "alice@example.com", "password123").await;
        let bob = create_user(&state.db, "bob@example.com", "password123").await;
        let read = create_notification(&state.db, &alice.id, "Old reply").await;
        NotificationRepository::mark_read(&state.db, &read.id).await.unwrap();
        create_notification(&state.db, &alice.id, "New reply").await;
        create_notification(&state.db, &bob.id, "Bob's reply").await;

        let token = AuthService::create_jwt(&state, &alice.id).unwrap();
        let (status, body) = send(&state, Method::GET, "/api/notifications/count", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "success": true, "data": { "count": 1 } }));
    }

    #[tokio::test]
    async fn read_all_clears_unread_count() {
        let state = test_state().await;
        let alice = create_user(&state.db, "alice@example.com", "password123").await;
        let bob = create_user(&state.db, "bob@example.com", "password123").await;
        create_notification(&state.db, &alice.id, "one").await;
        create_notification(&state.db, &alice.id, "two").await;
        create_notification(&state.db, &bob.id, "three").await;
        let token = AuthService::create_jwt(&state, &alice.id).unwrap();

        let (status, body) =
            send(&state, Method::POST, "/api/notifications/read-all", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["updated"], 2);

        let (_, body) = send(&state, Method::POST, "/api/notifications/read-all", Some(&token)).await;
        assert_eq!(body["data"]["updated"], 0);

        let (_, body) = send(&state, Method::GET, "/api/notifications/count", Some(&token)).await;
        assert_eq!(body["data"]["count"], 0);
        assert_eq!(NotificationRepository::count_unread(&state.db, &bob.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_paginates_and_filters() {
        let state = test_state().await;
        let alice = create_user(&state.db, "alice@example.com", "password123").await;
        for i in 0..5 {
            create_notification(&state.db, &alice.id, &format!("n{}", i)).await;
        }
        let token = AuthService::create_jwt(&state, &alice.id).unwrap();

        let (status, body) = send(
            &state,
            Method::GET,
            "/api/notifications?page=2&per_page=2",
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 5);
        assert_eq!(body["data"]["total_pages"], 3);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["items"][0]["type"], "reply");

        send(&state, Method::POST, "/api/notifications/read-all", Some(&token)).await;
        let (_, body) = send(
            &state,
            Method::GET,
            "/api/notifications?unread_only=true",
            Some(&token),
        )
        .await;
        assert_eq!(body["data"]["total"], 0);
        assert_eq!(body["data"]["total_pages"], 0);
    }

    #[tokio::test]
    async fn huge_page_is_rejected_not_overflowed() {
        let state = test_state().await;
        let alice = create_user(&state.db, "alice@example.com", "password123").await;
        let token = AuthService::create_jwt(&state, &alice.id).unwrap();

        let uri = format!("/api/notifications?page={}&per_page=100", i64::MAX);
        let (status, body) = send(&state, Method::GET, &uri, Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Page is out of range");

        // Far past the end but representable: empty page, no error.
        let (status, body) = send(
            &state,
            Method::GET,
            "/api/notifications?page=1000000&per_page=100",
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn mark_single_read_is_scoped_to_owner() {
        let state = test_state().await;
        let alice = create_user(&state.db, "alice@example.com", "password123").await;
        let bob = create_user(&state.db, "bob@example.com", "password123").await;
        let n = create_notification(&state.db, &alice.id, "For Alice").await;
        let uri = format!("/api/notifications/{}/read", n.id);

        let bob_token = AuthService::create_jwt(&state, &bob.id).unwrap();
        let (status, body) = send(&state, Method::POST, &uri, Some(&bob_token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Notification not found");

        let alice_token = AuthService::create_jwt(&state, &alice.id).unwrap();
        let (status, body) = send(&state, Method::POST, &uri, Some(&alice_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["is_read"], true);

        let (status, _) = send(&state, Method::POST, &uri, Some(&alice_token)).await;
        assert_eq!(status, StatusCode::OK);
    }
}
