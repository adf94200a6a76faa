use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ForumCategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Display position; categories are listed in ascending order.
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct CreateForumCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub order: i64,
}
