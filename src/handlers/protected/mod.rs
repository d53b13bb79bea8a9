// Protected handlers (JWT authentication required, /api/*)
//
// Every route in this tier goes through jwt_auth_middleware, which injects
// an AuthUser extension. Role checks happen per handler.
pub mod analyses;
pub mod analyze;
pub mod auth;
pub mod plans;
pub mod roles;
pub mod subscription;
pub mod teams;
pub mod usage;
pub mod users;
