use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::Team;
use crate::plans::{self, PlanId};

use super::{is_unique_violation, ServiceError};

/// Team listing row with the creator's display name joined in
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TeamSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
}

/// Membership row with user details joined in
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TeamMemberDetail {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub member_role: String,
    pub joined_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
}

pub struct TeamService {
    pool: PgPool,
}

impl TeamService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All teams, newest first (admin/manager view)
    pub async fn list_all(&self) -> Result<Vec<TeamSummary>, ServiceError> {
        let teams = sqlx::query_as::<_, TeamSummary>(
            r#"
            SELECT t.id, t.name, t.description, t.created_by, u.name AS created_by_name,
                   t.created_at,
                   (SELECT COUNT(*) FROM team_members m WHERE m.team_id = t.id) AS member_count
            FROM teams t
            LEFT JOIN users u ON u.id = t.created_by
            ORDER BY t.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }

    /// Teams the given user belongs to (plain-user view)
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<TeamSummary>, ServiceError> {
        let teams = sqlx::query_as::<_, TeamSummary>(
            r#"
            SELECT t.id, t.name, t.description, t.created_by, u.name AS created_by_name,
                   t.created_at,
                   (SELECT COUNT(*) FROM team_members m WHERE m.team_id = t.id) AS member_count
            FROM teams t
            JOIN team_members tm ON tm.team_id = t.id AND tm.user_id = $1
            LEFT JOIN users u ON u.id = t.created_by
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }

    pub async fn get_team(&self, id: Uuid) -> Result<Team, ServiceError> {
        sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Team {} not found", id)))
    }

    /// Create a team; the creator becomes its first member
    pub async fn create_team(
        &self,
        name: &str,
        description: Option<&str>,
        created_by: Uuid,
    ) -> Result<Team, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Team name is required".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (id, name, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name.trim())
        .bind(description)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO team_members (team_id, user_id, member_role) VALUES ($1, $2, 'owner')",
        )
        .bind(team.id)
        .bind(created_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(team)
    }

    pub async fn update_team(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Team, ServiceError> {
        sqlx::query_as::<_, Team>(
            r#"
            UPDATE teams
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Team {} not found", id)))
    }

    pub async fn delete_team(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(format!("Team {} not found", id)));
        }

        Ok(())
    }

    pub async fn members(&self, team_id: Uuid) -> Result<Vec<TeamMemberDetail>, ServiceError> {
        let members = sqlx::query_as::<_, TeamMemberDetail>(
            r#"
            SELECT tm.team_id, tm.user_id, tm.member_role, tm.joined_at, u.name, u.email
            FROM team_members tm
            JOIN users u ON u.id = tm.user_id
            WHERE tm.team_id = $1
            ORDER BY tm.joined_at
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Add a member, enforcing the team-size cap of the owner's plan
    pub async fn add_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        member_role: &str,
    ) -> Result<(), ServiceError> {
        let team = self.get_team(team_id).await?;

        let limit = self.member_limit_for(team.created_by).await?;
        let (current,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM team_members WHERE team_id = $1")
                .bind(team_id)
                .fetch_one(&self.pool)
                .await?;

        if current >= limit {
            return Err(ServiceError::TeamFull { limit });
        }

        sqlx::query(
            "INSERT INTO team_members (team_id, user_id, member_role) VALUES ($1, $2, $3)",
        )
        .bind(team_id)
        .bind(user_id)
        .bind(member_role)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("User is already a member of this team".to_string())
            } else {
                ServiceError::Database(e)
            }
        })?;

        Ok(())
    }

    pub async fn update_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        member_role: &str,
    ) -> Result<(), ServiceError> {
        let result = sqlx::query(
            "UPDATE team_members SET member_role = $3 WHERE team_id = $1 AND user_id = $2",
        )
        .bind(team_id)
        .bind(user_id)
        .bind(member_role)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Team member not found".to_string()));
        }

        Ok(())
    }

    pub async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        let result =
            sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
                .bind(team_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Team member not found".to_string()));
        }

        Ok(())
    }

    /// Member cap from the owner's plan; an unresolvable plan falls back to
    /// the free tier rather than blocking team management
    async fn member_limit_for(&self, owner_id: Uuid) -> Result<i64, ServiceError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT plan_id FROM users WHERE id = $1")
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?;

        let plan = row
            .and_then(|(plan_id,)| plan_id)
            .as_deref()
            .and_then(plans::find_plan)
            .unwrap_or_else(|| plans::get_plan(PlanId::Free));

        Ok(plan.max_team_members)
    }
}
