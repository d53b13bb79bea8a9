use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::plans::{self, PlanId};
use crate::services::UserService;

#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    pub plan_id: String,
}

/// POST /api/subscription/upgrade - Move the caller to a different plan
///
/// Payment verification happens upstream; this endpoint only validates the
/// plan id against the catalog and updates the assignment.
pub async fn upgrade(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpgradeRequest>,
) -> ApiResult<serde_json::Value> {
    let plan_id = PlanId::parse(&payload.plan_id)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid plan id: {}", payload.plan_id)))?;

    let service = UserService::new().await?;
    service.set_plan(auth.user_id, plan_id).await?;

    let plan = plans::get_plan(plan_id);
    info!(user_id = %auth.user_id, plan = %plan_id, "subscription changed");

    Ok(ApiResponse::success(json!({
        "plan": plan_id,
        "files_per_month": plan.files_per_month,
        "max_team_members": plan.max_team_members,
    })))
}
