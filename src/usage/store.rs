use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::clock::MonthKey;

/// Errors from the usage store
///
/// The meter propagates these to callers; an unavailable store must be
/// treated as a deny, never as an implicit allow.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("usage store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Persistence contract the meter depends on
///
/// Increments must be atomic at the store level: concurrent increments to
/// the same (user, month) key may never lose updates.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Raw plan id assigned to the user, if the user row exists and has one
    async fn plan_for_user(&self, user_id: Uuid) -> Result<Option<String>, StoreError>;

    /// Stored count for (user, month); None means no record yet (count 0)
    async fn usage_count(&self, user_id: Uuid, month: &MonthKey) -> Result<Option<i64>, StoreError>;

    /// Atomic upsert-increment by exactly 1; creates the record with count 1.
    /// Returns the new count.
    async fn increment_usage(&self, user_id: Uuid, month: &MonthKey) -> Result<i64, StoreError>;

    /// Atomic compare-and-increment: adds 1 only while the stored count is
    /// below `limit`. Returns the new count, or None if the limit was
    /// already reached and nothing was written.
    async fn increment_usage_below(
        &self,
        user_id: Uuid,
        month: &MonthKey,
        limit: i64,
    ) -> Result<Option<i64>, StoreError>;
}

/// Postgres-backed usage store
pub struct PgUsageStore {
    pool: PgPool,
}

impl PgUsageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageStore for PgUsageStore {
    async fn plan_for_user(&self, user_id: Uuid) -> Result<Option<String>, StoreError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT plan_id FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        // Missing row and NULL plan column both mean "no resolvable plan"
        Ok(row.and_then(|(plan_id,)| plan_id))
    }

    async fn usage_count(&self, user_id: Uuid, month: &MonthKey) -> Result<Option<i64>, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT files_analyzed FROM file_analysis_usage WHERE user_id = $1 AND month_year = $2",
        )
        .bind(user_id)
        .bind(month.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(count,)| count))
    }

    async fn increment_usage(&self, user_id: Uuid, month: &MonthKey) -> Result<i64, StoreError> {
        // Single statement so concurrent increments cannot lose updates
        let (count,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO file_analysis_usage (user_id, month_year, files_analyzed)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, month_year)
            DO UPDATE SET files_analyzed = file_analysis_usage.files_analyzed + 1,
                          updated_at = now()
            RETURNING files_analyzed
            "#,
        )
        .bind(user_id)
        .bind(month.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn increment_usage_below(
        &self,
        user_id: Uuid,
        month: &MonthKey,
        limit: i64,
    ) -> Result<Option<i64>, StoreError> {
        if limit <= 0 {
            return Ok(None);
        }

        // The WHERE clause turns the upsert into a conditional increment;
        // an absent row counts as 0 and always admits the first unit.
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO file_analysis_usage (user_id, month_year, files_analyzed)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, month_year)
            DO UPDATE SET files_analyzed = file_analysis_usage.files_analyzed + 1,
                          updated_at = now()
            WHERE file_analysis_usage.files_analyzed < $3
            RETURNING files_analyzed
            "#,
        )
        .bind(user_id)
        .bind(month.as_str())
        .bind(limit)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(count,)| count))
    }
}

/// In-memory usage store for tests and local development
///
/// Mirrors the Postgres store's contract, including increment atomicity
/// (guaranteed here by the interior mutex).
#[derive(Default)]
pub struct MemoryUsageStore {
    plans: Mutex<HashMap<Uuid, String>>,
    counts: Mutex<HashMap<(Uuid, String), i64>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a raw plan id to a user (the string is deliberately not
    /// validated; unknown ids exercise the meter's degraded path)
    pub fn set_plan(&self, user_id: Uuid, plan_id: &str) {
        self.plans.lock().unwrap().insert(user_id, plan_id.to_string());
    }

    pub fn clear_plan(&self, user_id: Uuid) {
        self.plans.lock().unwrap().remove(&user_id);
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn plan_for_user(&self, user_id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self.plans.lock().unwrap().get(&user_id).cloned())
    }

    async fn usage_count(&self, user_id: Uuid, month: &MonthKey) -> Result<Option<i64>, StoreError> {
        let counts = self.counts.lock().unwrap();
        Ok(counts.get(&(user_id, month.as_str().to_string())).copied())
    }

    async fn increment_usage(&self, user_id: Uuid, month: &MonthKey) -> Result<i64, StoreError> {
        let mut counts = self.counts.lock().unwrap();
        let entry = counts.entry((user_id, month.as_str().to_string())).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn increment_usage_below(
        &self,
        user_id: Uuid,
        month: &MonthKey,
        limit: i64,
    ) -> Result<Option<i64>, StoreError> {
        if limit <= 0 {
            return Ok(None);
        }

        let mut counts = self.counts.lock().unwrap();
        let entry = counts.entry((user_id, month.as_str().to_string())).or_insert(0);
        if *entry >= limit {
            return Ok(None);
        }
        *entry += 1;
        Ok(Some(*entry))
    }
}
