//! Direct user/category mutations used by the maintenance subcommands.
//! These bypass the HTTP layer and work straight against the pool.

use sqlx::SqlitePool;

use crate::db::{
    CreateForumCategory, CreateNotification, CreateUser, ForumCategoryRepository, Notification,
    NotificationRepository, User, UserRepository, UserRole,
};
use crate::error::{AppError, AppResult};
use crate::services::password;

/// Categories inserted by `seed-categories` on an empty database.
const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("General Discussion", "general", "Anything that doesn't fit elsewhere"),
    ("Ask an Expert", "ask-an-expert", "Questions for verified experts"),
    ("Announcements", "announcements", "News and updates from the team"),
    ("Feedback", "feedback", "Ideas and bug reports for the platform"),
];

/// Promote the user with the given email to expert and mark them verified.
pub async fn promote_expert(pool: &SqlitePool, email: &str) -> AppResult<User> {
    let user = UserRepository::set_role_by_email(pool, email, UserRole::Expert, true)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No user with email {}", email)))?;

    tracing::info!("Promoted user {} ({}) to expert", user.id, user.email);
    Ok(user)
}

/// Replace the password of the user with the given email.
pub async fn reset_password(pool: &SqlitePool, email: &str, new_password: &str) -> AppResult<User> {
    password::validate_password(new_password)?;
    let hash = password::hash_password(new_password)?;

    let user = UserRepository::set_password_hash_by_email(pool, email, &hash)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No user with email {}", email)))?;

    tracing::info!("Reset password for user {} ({})", user.id, user.email);
    Ok(user)
}

pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    new_password: &str,
    role: UserRole,
) -> AppResult<User> {
    if !email.contains('@') {
        return Err(AppError::Validation(format!("Invalid email address: {}", email)));
    }
    password::validate_password(new_password)?;

    let user = UserRepository::create(
        pool,
        CreateUser {
            email: email.to_string(),
            name: name.to_string(),
            password_hash: password::hash_password(new_password)?,
            role,
            // Experts and admins created from the command line are trusted.
            is_verified: role != UserRole::User,
        },
    )
    .await?;

    tracing::info!("Created {} user {} ({})", role.as_str(), user.id, user.email);
    Ok(user)
}

/// Deliver a notification to the user with the given email.
pub async fn notify_user(
    pool: &SqlitePool,
    email: &str,
    notification_type: &str,
    title: &str,
    message: &str,
    link: Option<&str>,
) -> AppResult<Notification> {
    let user = UserRepository::find_by_email(pool, email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No user with email {}", email)))?;

    let notification = NotificationRepository::create(
        pool,
        CreateNotification {
            user_id: user.id,
            notification_type: notification_type.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            link: link.map(str::to_string),
        },
    )
    .await?;

    tracing::info!("Created notification {} for {}", notification.id, email);
    Ok(notification)
}

/// Insert the default categories when none exist. Returns how many were inserted.
pub async fn seed_categories(pool: &SqlitePool) -> AppResult<usize> {
    if ForumCategoryRepository::count(pool).await? > 0 {
        tracing::info!("Forum categories already present, skipping seed");
        return Ok(0);
    }

    for (position, (name, slug, description)) in DEFAULT_CATEGORIES.iter().enumerate() {
        ForumCategoryRepository::create(
            pool,
            CreateForumCategory {
                name: name.to_string(),
                slug: slug.to_string(),
                description: Some(description.to_string()),
                order: position as i64,
            },
        )
        .await?;
    }

    tracing::info!("Seeded {} forum categories", DEFAULT_CATEGORIES.len());
    Ok(DEFAULT_CATEGORIES.len())
}
