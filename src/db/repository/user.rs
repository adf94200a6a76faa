use chrono::Utc;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// User Repository
// ============================================================================

pub struct UserRepository;

const USER_COLUMNS: &str =
    "id, email, name, password_hash, role, is_verified, created_at, updated_at";

fn map_user(r: SqliteRow) -> AppResult<User> {
    let role: String = r.get("role");
    let role = UserRole::from_str(&role).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("Unknown role '{}' stored for user", role))
    })?;

    Ok(User {
        id: r.get("id"),
        email: r.get("email"),
        name: r.get("name"),
        password_hash: r.get("password_hash"),
        role,
        is_verified: r.get("is_verified"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

impl UserRepository {
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)?;

        row.map(map_user).transpose()
    }

    /// First user whose email matches, case-insensitively.
    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower(?) LIMIT 1",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        row.map(map_user).transpose()
    }

    pub async fn create(pool: &SqlitePool, user: CreateUser) -> AppResult<User> {
        if Self::find_by_email(pool, &user.email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A user with email {} already exists",
                user.email
            )));
        }

        Self::insert(pool, &user).await
    }

    async fn insert(pool: &SqlitePool, user: &CreateUser) -> AppResult<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, is_verified, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&id)
        .bind(user.email.trim())
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_verified)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            // A concurrent insert can slip past the lookup in `create`.
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict(
                format!("A user with email {} already exists", user.email),
            ),
            other => AppError::Database(other),
        })?;

        map_user(row)
    }

    /// Set role and verification flag for the user with the given email.
    /// Returns the updated user, or `None` if no user matched.
    pub async fn set_role_by_email(
        pool: &SqlitePool,
        email: &str,
        role: UserRole,
        is_verified: bool,
    ) -> AppResult<Option<User>> {
        let Some(user) = Self::find_by_email(pool, email).await? else {
            return Ok(None);
        };

        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET role = ?, is_verified = ?, updated_at = ?
            WHERE id = ?
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(role.as_str())
        .bind(is_verified)
        .bind(Utc::now().naive_utc())
        .bind(&user.id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        map_user(row).map(Some)
    }

    /// Replace the stored password hash for the user with the given email.
    /// Returns `None` if no user matched.
    pub async fn set_password_hash_by_email(
        pool: &SqlitePool,
        email: &str,
        password_hash: &str,
    ) -> AppResult<Option<User>> {
        let Some(user) = Self::find_by_email(pool, email).await? else {
            return Ok(None);
        };

        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET password_hash = ?, updated_at = ?
            WHERE id = ?
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(password_hash)
        .bind(Utc::now().naive_utc())
        .bind(&user.id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        map_user(row).map(Some)
    }
}
