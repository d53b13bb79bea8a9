use axum::extract::Path;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::plans::{self, Plan, PlanId};
use crate::services::{NewUser, UpdateUser, UserService};
use crate::types::{Role, UserStatus};

/// User row with catalog plan metadata resolved in-process
#[derive(Debug, Serialize)]
pub struct UserWithPlan {
    #[serde(flatten)]
    pub user: User,
    pub plan: Option<&'static Plan>,
}

fn with_plan(user: User) -> UserWithPlan {
    let plan = user.plan_id.as_deref().and_then(plans::find_plan);
    UserWithPlan { user, plan }
}

/// GET /api/users - List all users (admin and manager only)
pub async fn list_users(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<UserWithPlan>> {
    auth.require_manager()?;

    let service = UserService::new().await?;
    let users = service.list_users().await?;
    Ok(ApiResponse::success(users.into_iter().map(with_plan).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub plan_id: Option<PlanId>,
}

/// POST /api/users - Create a user (admin only)
pub async fn create_user(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<UserWithPlan> {
    auth.require_admin()?;

    if payload.password.len() < 8 {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }
    let password_hash = crate::auth::hash_password(&payload.password)?;

    let service = UserService::new().await?;
    let user = service
        .create_user(NewUser {
            name: payload.name,
            email: payload.email,
            password_hash,
            role: payload.role.unwrap_or(Role::User).as_str().to_string(),
            status: payload.status.unwrap_or(UserStatus::Active).as_str().to_string(),
            plan_id: payload.plan_id.unwrap_or(PlanId::Free),
        })
        .await?;

    info!(user_id = %user.id, created_by = %auth.user_id, "created user");
    Ok(ApiResponse::created(with_plan(user)))
}

/// GET /api/users/:id - Show one user (admin, or the user themselves)
pub async fn get_user(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserWithPlan> {
    if auth.user_id != id {
        auth.require_admin()?;
    }

    let service = UserService::new().await?;
    let user = service.get_user(id).await?;
    Ok(ApiResponse::success(with_plan(user)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub plan_id: Option<PlanId>,
}

/// PUT /api/users/:id - Update a user
///
/// Admins may change anything; users may only rename themselves.
pub async fn update_user(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<UserWithPlan> {
    let self_update = auth.user_id == id;
    if !self_update {
        auth.require_admin()?;
    }

    if self_update
        && !auth.role.is_admin()
        && (payload.role.is_some() || payload.status.is_some() || payload.plan_id.is_some())
    {
        return Err(ApiError::forbidden("Only admins can change role, status, or plan"));
    }

    let service = UserService::new().await?;
    let user = service
        .update_user(
            id,
            UpdateUser {
                name: payload.name,
                role: payload.role.map(|r| r.as_str().to_string()),
                status: payload.status.map(|s| s.as_str().to_string()),
                plan_id: payload.plan_id,
            },
        )
        .await?;

    Ok(ApiResponse::success(with_plan(user)))
}

/// DELETE /api/users/:id - Remove a user (admin only)
pub async fn delete_user(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_admin()?;

    if auth.user_id == id {
        return Err(ApiError::bad_request("Admins cannot delete their own account"));
    }

    let service = UserService::new().await?;
    service.delete_user(id).await?;

    info!(user_id = %id, deleted_by = %auth.user_id, "deleted user");
    Ok(ApiResponse::success(serde_json::json!({ "deleted": id })))
}
