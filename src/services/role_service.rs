use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::RoleDefinition;

use super::{is_unique_violation, ServiceError};

/// CRUD over the permission matrix (named roles and their allowed actions)
pub struct RoleService {
    pool: PgPool,
}

impl RoleService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleDefinition>, ServiceError> {
        let roles = sqlx::query_as::<_, RoleDefinition>("SELECT * FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    pub async fn create_role(
        &self,
        name: &str,
        description: Option<&str>,
        permissions: Value,
    ) -> Result<RoleDefinition, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Role name is required".to_string()));
        }

        let role = sqlx::query_as::<_, RoleDefinition>(
            r#"
            INSERT INTO roles (id, name, description, permissions)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name.trim())
        .bind(description)
        .bind(permissions)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("A role with this name already exists".to_string())
            } else {
                ServiceError::Database(e)
            }
        })?;

        Ok(role)
    }

    pub async fn update_role(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        permissions: Option<Value>,
    ) -> Result<RoleDefinition, ServiceError> {
        sqlx::query_as::<_, RoleDefinition>(
            r#"
            UPDATE roles
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                permissions = COALESCE($4, permissions),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(permissions)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Role {} not found", id)))
    }

    pub async fn delete_role(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(format!("Role {} not found", id)));
        }

        Ok(())
    }
}
