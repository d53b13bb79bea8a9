use axum::Extension;

use crate::database::models::DocumentAnalysis;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::AnalysisService;

/// GET /api/analyses - Analysis history, newest first
///
/// Admins see every user's analyses; everyone else only their own.
pub async fn list_analyses(
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<DocumentAnalysis>> {
    let service = AnalysisService::new().await?;
    let analyses = service
        .list_for(auth.user_id, auth.role.is_admin())
        .await?;
    Ok(ApiResponse::success(analyses))
}
