use axum::Extension;

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::UserService;

/// GET /api/auth/whoami - Current authenticated user, fresh from the database
pub async fn whoami(Extension(auth): Extension<AuthUser>) -> ApiResult<User> {
    let service = UserService::new().await?;
    let user = service.get_user(auth.user_id).await?;
    Ok(ApiResponse::success(user))
}
