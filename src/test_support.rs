//! Shared fixtures for unit tests: in-memory database and seeded rows.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::{
    CreateForumCategory, CreateNotification, CreateUser, ForumCategory, ForumCategoryRepository,
    Notification, NotificationRepository, User, UserRepository, UserRole,
};
use crate::services::auth::Claims;
use crate::services::password;
use crate::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret-key-that-is-at-least-32-characters-long";

/// Fresh in-memory database with migrations applied. A single connection that
/// never expires keeps the database alive for the whole test.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("in-memory options")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}

pub async fn test_state() -> Arc<AppState> {
    let mut config = Config::default();
    config.jwt.secret = TEST_JWT_SECRET.to_string();
    Arc::new(AppState {
        db: test_pool().await,
        config,
    })
}

pub async fn create_user(pool: &SqlitePool, email: &str, plain_password: &str) -> User {
    UserRepository::create(
        pool,
        CreateUser {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            password_hash: password::hash_password_with_cost(plain_password, 4).unwrap(),
            role: UserRole::User,
            is_verified: false,
        },
    )
    .await
    .expect("create user")
}

pub async fn create_category(pool: &SqlitePool, name: &str, slug: &str, order: i64) -> ForumCategory {
    ForumCategoryRepository::create(
        pool,
        CreateForumCategory {
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            order,
        },
    )
    .await
    .expect("create category")
}

pub async fn create_notification(pool: &SqlitePool, user_id: &str, title: &str) -> Notification {
    NotificationRepository::create(
        pool,
        CreateNotification {
            user_id: user_id.to_string(),
            notification_type: "reply".to_string(),
            title: title.to_string(),
            message: format!("{} (details)", title),
            link: None,
        },
    )
    .await
    .expect("create notification")
}

/// JWT signed with the test secret whose `exp` lies an hour in the past,
/// well beyond the default validation leeway.
pub fn expired_token(state: &Arc<AppState>, user_id: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: (now - 7200) as usize,
        exp: (now - 3600) as usize,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(state.config.jwt.secret.as_bytes()),
    )
    .expect("encode expired token")
}
