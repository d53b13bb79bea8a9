pub mod analysis_service;
pub mod role_service;
pub mod team_service;
pub mod user_service;

pub use analysis_service::{AnalysisService, NewAnalysis};
pub use role_service::RoleService;
pub use team_service::{TeamService, TeamSummary, TeamMemberDetail};
pub use user_service::{NewUser, UpdateUser, UserService};

use thiserror::Error;

use crate::database::DatabaseError;

/// Errors shared by the CRUD services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] DatabaseError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Team is full (plan limit {limit})")]
    TeamFull { limit: i64 },
}

/// Postgres unique-constraint violation (duplicate key)
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
