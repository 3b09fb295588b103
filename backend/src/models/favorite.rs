// src/models/favorite.rs

use serde::Serialize;
use sqlx::FromRow;

/// Represents the 'user_favorites' table (bookmarked questions).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Favorite {
    pub question_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
