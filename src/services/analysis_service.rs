use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::DocumentAnalysis;

use super::ServiceError;

/// Fields persisted for one completed analysis
#[derive(Debug)]
pub struct NewAnalysis {
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
}

pub struct AnalysisService {
    pool: PgPool,
}

impl AnalysisService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, analysis: NewAnalysis) -> Result<DocumentAnalysis, ServiceError> {
        let saved = sqlx::query_as::<_, DocumentAnalysis>(
            r#"
            INSERT INTO document_analyses
                (id, user_id, filename, file_type, file_size, word_count, char_count,
                 summary, keywords, key_points, action_items)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(analysis.user_id)
        .bind(&analysis.filename)
        .bind(&analysis.file_type)
        .bind(analysis.file_size)
        .bind(analysis.word_count)
        .bind(analysis.char_count)
        .bind(&analysis.summary)
        .bind(&analysis.keywords)
        .bind(&analysis.key_points)
        .bind(&analysis.action_items)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    /// Analysis history, newest first. Admins see every user's analyses;
    /// everyone else sees only their own.
    pub async fn list_for(
        &self,
        user_id: Uuid,
        include_all: bool,
    ) -> Result<Vec<DocumentAnalysis>, ServiceError> {
        let analyses = if include_all {
            sqlx::query_as::<_, DocumentAnalysis>(
                "SELECT * FROM document_analyses ORDER BY created_at DESC",
            )
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, DocumentAnalysis>(
                "SELECT * FROM document_analyses WHERE user_id = $1 ORDER BY created_at DESC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(analyses)
    }
}
