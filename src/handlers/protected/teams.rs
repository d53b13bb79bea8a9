use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::database::models::Team;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{TeamMemberDetail, TeamService, TeamSummary};

/// GET /api/teams - List teams
///
/// Admins and managers see every team; plain users only the teams they
/// belong to.
pub async fn list_teams(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<TeamSummary>> {
    let service = TeamService::new().await?;

    let teams = if auth.role.is_manager_or_admin() {
        service.list_all().await?
    } else {
        service.list_for_user(auth.user_id).await?
    };

    Ok(ApiResponse::success(teams))
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    pub description: Option<String>,
}

/// POST /api/teams - Create a team (manager or admin)
pub async fn create_team(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateTeamRequest>,
) -> ApiResult<Team> {
    auth.require_manager()?;

    let service = TeamService::new().await?;
    let team = service
        .create_team(&payload.name, payload.description.as_deref(), auth.user_id)
        .await?;

    info!(team_id = %team.id, created_by = %auth.user_id, "created team");
    Ok(ApiResponse::created(team))
}

/// GET /api/teams/:id - Show one team
pub async fn get_team(
    Extension(_auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Team> {
    let service = TeamService::new().await?;
    let team = service.get_team(id).await?;
    Ok(ApiResponse::success(team))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// PUT /api/teams/:id - Update a team (creator, manager, or admin)
pub async fn update_team(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTeamRequest>,
) -> ApiResult<Team> {
    let service = TeamService::new().await?;

    let team = service.get_team(id).await?;
    if team.created_by != auth.user_id {
        auth.require_manager()?;
    }

    let team = service
        .update_team(id, payload.name.as_deref(), payload.description.as_deref())
        .await?;
    Ok(ApiResponse::success(team))
}

/// DELETE /api/teams/:id - Remove a team (admin only)
pub async fn delete_team(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    auth.require_admin()?;

    let service = TeamService::new().await?;
    service.delete_team(id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "deleted": id })))
}

/// GET /api/teams/:id/members - List team members with user details
pub async fn list_members(
    Extension(_auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<TeamMemberDetail>> {
    let service = TeamService::new().await?;
    let members = service.members(id).await?;
    Ok(ApiResponse::success(members))
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    pub member_role: Option<String>,
}

/// POST /api/teams/:id/members - Add a member (manager or admin)
///
/// Fails with a conflict when the owner's plan team-size cap is reached.
pub async fn add_member(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddMemberRequest>,
) -> ApiResult<serde_json::Value> {
    auth.require_manager()?;

    let member_role = payload.member_role.as_deref().unwrap_or("member");
    if member_role.trim().is_empty() {
        return Err(ApiError::bad_request("member_role must not be empty"));
    }

    let service = TeamService::new().await?;
    service.add_member(id, payload.user_id, member_role).await?;

    Ok(ApiResponse::created(serde_json::json!({
        "team_id": id,
        "user_id": payload.user_id,
        "member_role": member_role,
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub member_role: String,
}

/// PUT /api/teams/:id/members/:user_id - Change a member's team role
pub async fn update_member(
    Extension(auth): Extension<AuthUser>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateMemberRequest>,
) -> ApiResult<serde_json::Value> {
    auth.require_manager()?;

    let service = TeamService::new().await?;
    service.update_member(id, user_id, &payload.member_role).await?;

    Ok(ApiResponse::success(serde_json::json!({
        "team_id": id,
        "user_id": user_id,
        "member_role": payload.member_role,
    })))
}

/// DELETE /api/teams/:id/members/:user_id - Remove a member
pub async fn remove_member(
    Extension(auth): Extension<AuthUser>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<serde_json::Value> {
    // Members may leave on their own; otherwise manager access is required
    if auth.user_id != user_id {
        auth.require_manager()?;
    }

    let service = TeamService::new().await?;
    service.remove_member(id, user_id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "removed": user_id })))
}
