use axum::Extension;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::plans::{self, Plan};

/// GET /api/plans - The plan catalog in display order (ascending price)
pub async fn list_plans(Extension(_auth): Extension<AuthUser>) -> ApiResult<&'static [Plan]> {
    Ok(ApiResponse::success(plans::all_plans()))
}
