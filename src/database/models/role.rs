use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A row of the permission matrix: a named role mapping resources to the
/// actions it may perform on them, e.g. {"users": ["read", "write"]}
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleDefinition {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
