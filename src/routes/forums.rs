use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::db::{ForumCategory, ForumCategoryRepository};
use crate::error::{AppResult, ResultExt};
use crate::response::ApiResponse;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/categories", get(list_categories))
}

/// List forum categories in display order. Public, no authentication.
async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ForumCategory>>>> {
    let categories = ForumCategoryRepository::list_ordered(&state.db)
        .await
        .context_msg("Failed to fetch categories")?;

    Ok(Json(ApiResponse::ok(categories)))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_router;
    use crate::test_support::{create_category, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn categories_request() -> Request<Body> {
        Request::get("/api/forums/categories")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn categories_are_public_and_ordered() {
        let state = test_state().await;
        create_category(&state.db, "Off-topic", "off-topic", 10).await;
        create_category(&state.db, "Introductions", "introductions", 0).await;
        create_category(&state.db, "Ask an Expert", "ask-an-expert", 5).await;

        let response = test_router(state).oneshot(categories_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], true);
        let slugs: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["slug"].as_str().unwrap())
            .collect();
        assert_eq!(slugs, vec!["introductions", "ask-an-expert", "off-topic"]);
        assert_eq!(body["data"][2]["order"], 10);
    }

    #[tokio::test]
    async fn empty_category_list_is_success() {
        let state = test_state().await;
        let response = test_router(state).oneshot(categories_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true, "data": [] }));
    }

    #[tokio::test]
    async fn database_failure_is_500_with_generic_message() {
        let state = test_state().await;
        sqlx::query("DROP TABLE forum_categories")
            .execute(&state.db)
            .await
            .unwrap();

        let response = test_router(state).oneshot(categories_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "success": false, "error": "Failed to fetch categories" })
        );
    }
}
