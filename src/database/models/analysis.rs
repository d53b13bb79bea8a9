use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted result of one document analysis
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentAnalysis {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub word_count: i64,
    pub char_count: i64,
    pub summary: String,
    pub keywords: Vec<String>,
    pub key_points: Vec<String>,
    pub action_items: Vec<String>,
    pub created_at: DateTime<Utc>,
}
