use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Notification Repository
// ============================================================================

pub struct NotificationRepository;

impl NotificationRepository {
    pub async fn create(
        pool: &SqlitePool,
        notification: CreateNotification,
    ) -> AppResult<Notification> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, notification_type, title, message, link, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?)
            RETURNING id, user_id, notification_type, title, message, link, is_read, created_at
            "#,
        )
        .bind(&id)
        .bind(&notification.user_id)
        .bind(&notification.notification_type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.link)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Notifications for a user, newest first, with optional unread filter and pagination.
    pub async fn find_by_user_id(
        pool: &SqlitePool,
        user_id: &str,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, notification_type, title, message, link, is_read, created_at
            FROM notifications
            WHERE user_id = ? AND (? = 0 OR is_read = 0)
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn count_by_user_id(
        pool: &SqlitePool,
        user_id: &str,
        unread_only: bool,
    ) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND (? = 0 OR is_read = 0)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn count_unread(pool: &SqlitePool, user_id: &str) -> AppResult<i64> {
        Self::count_by_user_id(pool, user_id, true).await
    }

    /// Mark every unread notification of the user as read; returns the number of rows changed.
    pub async fn mark_all_read(pool: &SqlitePool, user_id: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    /// The notification with the given id, only if it belongs to the user.
    pub async fn find_for_user(
        pool: &SqlitePool,
        id: &str,
        user_id: &str,
    ) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, notification_type, title, message, link, is_read, created_at
            FROM notifications
            WHERE id = ? AND user_id = ?
            LIMIT 1
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn mark_read(pool: &SqlitePool, id: &str) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = 1
            WHERE id = ?
            RETURNING id, user_id, notification_type, title, message, link, is_read, created_at
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }
}
