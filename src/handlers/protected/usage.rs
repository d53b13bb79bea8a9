use std::sync::Arc;

use axum::Extension;

use crate::database::manager::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::usage::{PgUsageStore, SystemClock, UsageMeter, UsageSnapshot};

/// Build the production meter: Postgres-backed store, wall clock
pub(crate) async fn production_meter() -> Result<UsageMeter, crate::error::ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(UsageMeter::new(
        Arc::new(PgUsageStore::new(pool)),
        Arc::new(SystemClock),
    ))
}

/// GET /api/usage - Current month's usage for the caller
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": { "current": 12, "limit": 50, "plan_name": "Free" }
/// }
/// ```
pub async fn get_usage(Extension(auth): Extension<AuthUser>) -> ApiResult<UsageSnapshot> {
    let meter = production_meter().await?;
    let snapshot = meter.get_usage(auth.user_id).await?;
    Ok(ApiResponse::success(snapshot))
}
