use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::RoleDefinition;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::RoleService;

/// GET /api/roles - List the permission matrix, alphabetical by role name
pub async fn list_roles(Extension(_auth): Extension<AuthUser>) -> ApiResult<Vec<RoleDefinition>> {
    let service = RoleService::new().await?;
    let roles = service.list_roles().await?;
    Ok(ApiResponse::success(roles))
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
    /// Resource -> allowed actions, e.g. {"users": ["read", "write"]}
    pub permissions: Option<Value>,
}

/// POST /api/roles - Create a role (admin only)
pub async fn create_role(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<RoleDefinition> {
    auth.require_admin()?;

    let service = RoleService::new().await?;
    let role = service
        .create_role(
            &payload.name,
            payload.description.as_deref(),
            payload.permissions.unwrap_or_else(|| Value::Object(Default::default())),
        )
        .await?;

    Ok(ApiResponse::created(role))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Value>,
}

/// PUT /api/roles/:id - Update a role (admin only)
pub async fn update_role(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<RoleDefinition> {
    auth.require_admin()?;

    let service = RoleService::new().await?;
    let role = service
        .update_role(
            id,
            payload.name.as_deref(),
            payload.description.as_deref(),
            payload.permissions,
        )
        .await?;

    Ok(ApiResponse::success(role))
}

/// DELETE /api/roles/:id - Remove a role (admin only)
pub async fn delete_role(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_admin()?;

    let service = RoleService::new().await?;
    service.delete_role(id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "deleted": id })))
}
