use sqlx::PgPool;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::plans::PlanId;

use super::{is_unique_violation, ServiceError};

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub plan_id: PlanId,
}

/// Partial update; None fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub plan_id: Option<PlanId>,
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All users, newest first
    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, ServiceError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, ServiceError> {
        if new_user.name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Name is required".to_string()));
        }
        if !new_user.email.contains('@') {
            return Err(ServiceError::InvalidInput("A valid email is required".to_string()));
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, status, plan_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_user.name.trim())
        .bind(new_user.email.trim().to_lowercase())
        .bind(&new_user.password_hash)
        .bind(&new_user.role)
        .bind(&new_user.status)
        .bind(new_user.plan_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("A user with this email already exists".to_string())
            } else {
                ServiceError::Database(e)
            }
        })?;

        Ok(user)
    }

    pub async fn update_user(&self, id: Uuid, changes: UpdateUser) -> Result<User, ServiceError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                role = COALESCE($3, role),
                status = COALESCE($4, status),
                plan_id = COALESCE($5, plan_id),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.role.as_deref())
        .bind(changes.status.as_deref())
        .bind(changes.plan_id.map(|plan| plan.as_str()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))?;

        Ok(user)
    }

    /// Subscription change: point the user at a different catalog plan
    pub async fn set_plan(&self, id: Uuid, plan_id: PlanId) -> Result<(), ServiceError> {
        let result = sqlx::query("UPDATE users SET plan_id = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(plan_id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(format!("User {} not found", id)));
        }

        Ok(())
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(format!("User {} not found", id)));
        }

        Ok(())
    }
}
