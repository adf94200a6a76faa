use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Forum Category Repository
// ============================================================================

pub struct ForumCategoryRepository;

impl ForumCategoryRepository {
    /// All categories, ordered by their display position (ties broken by name).
    pub async fn list_ordered(pool: &SqlitePool) -> AppResult<Vec<ForumCategory>> {
        sqlx::query_as::<_, ForumCategory>(
            r#"
            SELECT id, name, slug, description, sort_order, created_at
            FROM forum_categories
            ORDER BY sort_order ASC, name ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn count(pool: &SqlitePool) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM forum_categories")
            .fetch_one(pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn create(
        pool: &SqlitePool,
        category: CreateForumCategory,
    ) -> AppResult<ForumCategory> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, ForumCategory>(
            r#"
            INSERT INTO forum_categories (id, name, slug, description, sort_order, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, name, slug, description, sort_order, created_at
            "#,
        )
        .bind(&id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.order)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict(
                format!("A category with slug {} already exists", category.slug),
            ),
            other => AppError::Database(other),
        })
    }
}
