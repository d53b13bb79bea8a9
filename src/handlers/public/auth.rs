use axum::{response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{self, Claims};
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::plans::PlanId;
use crate::services::{NewUser, UserService};
use crate::types::{Role, UserStatus};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register - Create a new account and receive a JWT token
///
/// New accounts start on the free plan with the plain `user` role; role and
/// plan changes go through the protected admin endpoints.
///
/// Expected Input:
/// ```json
/// {
///   "name": "string",       // Required: Display name
///   "email": "string",      // Required: Unique email address
///   "password": "string"    // Required: At least 8 characters
/// }
/// ```
pub async fn register(Json(payload): Json<RegisterRequest>) -> Result<impl IntoResponse, ApiError> {
    if payload.password.len() < 8 {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }

    let password_hash = auth::hash_password(&payload.password)?;

    let service = UserService::new().await?;
    let user = service
        .create_user(NewUser {
            name: payload.name,
            email: payload.email,
            password_hash,
            role: Role::User.as_str().to_string(),
            status: UserStatus::Active.as_str().to_string(),
            plan_id: PlanId::Free,
        })
        .await?;

    info!(user_id = %user.id, "registered new account");

    let role = Role::parse(&user.role);
    let token = auth::generate_jwt(&Claims::new(user.id, user.email.clone(), role))?;

    Ok(ApiResponse::created(json!({
        "token": token,
        "user": user,
    })))
}

/// POST /auth/login - Authenticate and receive a JWT token
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "user": { "id": "...", "name": "...", "email": "...", "role": "user" }
///   }
/// }
/// ```
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<impl IntoResponse, ApiError> {
    let service = UserService::new().await?;

    let user = service
        .find_by_email(&payload.email.trim().to_lowercase())
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !auth::verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "failed login attempt");
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    if UserStatus::parse(&user.status) != UserStatus::Active {
        return Err(ApiError::forbidden("Account is inactive"));
    }

    let role = Role::parse(&user.role);
    let token = auth::generate_jwt(&Claims::new(user.id, user.email.clone(), role))?;

    Ok(ApiResponse::success(json!({
        "token": token,
        "user": user,
    })))
}
