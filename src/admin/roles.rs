/// Admin accounts and role management
use crate::{
    auth::{hash_password, verify_password},
    db::{self, models::sqlite_timestamp},
    error::{AppError, AppResult},
    validation,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::str::FromStr;

/// Admin role levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages students and grades
    Admin,
    /// Additionally manages admin accounts; cannot be deleted
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }

    /// Check if this role can perform actions requiring another role
    pub fn can_act_as(&self, required: Role) -> bool {
        self >= &required
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::SuperAdmin),
            _ => Err(AppError::Internal(format!("Invalid role: {}", s))),
        }
    }
}

/// Admin as exposed over the API (no password hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[serde(with = "sqlite_timestamp")]
    pub created_at: NaiveDateTime,
}

/// Admin row including the stored hash
#[derive(Debug, Clone)]
struct AdminRecord {
    profile: AdminProfile,
    password_hash: String,
}

/// What the bootstrap seed did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    Promoted,
    Unchanged,
    /// Another account already holds the superadmin role; nothing was written
    Skipped,
}

/// Admin account manager
#[derive(Clone)]
pub struct AdminManager {
    db: SqlitePool,
}

impl AdminManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Make sure the configured superadmin exists and holds the role.
    ///
    /// At most one superadmin ever exists: if another account already holds
    /// the role, the configured username is neither created nor promoted.
    pub async fn ensure_superadmin(&self, username: &str, password: &str) -> AppResult<SeedOutcome> {
        let username = username.trim();
        let existing = self.find_by_username(username).await?;

        if existing
            .as_ref()
            .is_some_and(|record| record.profile.role == Role::SuperAdmin)
        {
            return Ok(SeedOutcome::Unchanged);
        }

        let holder: Option<String> =
            sqlx::query_scalar("SELECT username FROM admins WHERE role = ? ORDER BY id LIMIT 1")
                .bind(Role::SuperAdmin.as_str())
                .fetch_optional(&self.db)
                .await?;
        if let Some(holder) = holder {
            tracing::warn!(
                "Superadmin '{}' already exists; not seeding '{}'",
                holder,
                username
            );
            return Ok(SeedOutcome::Skipped);
        }

        match existing {
            None => {
                let hash = hash_password(password).await?;
                sqlx::query("INSERT INTO admins (username, password, role) VALUES (?, ?, ?)")
                    .bind(username)
                    .bind(&hash)
                    .bind(Role::SuperAdmin.as_str())
                    .execute(&self.db)
                    .await?;
                Ok(SeedOutcome::Created)
            }
            Some(record) => {
                sqlx::query("UPDATE admins SET role = ? WHERE id = ?")
                    .bind(Role::SuperAdmin.as_str())
                    .bind(record.profile.id)
                    .execute(&self.db)
                    .await?;
                Ok(SeedOutcome::Promoted)
            }
        }
    }

    /// Verify credentials. Unknown user and wrong password look the same.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<AdminProfile> {
        let invalid = || AppError::Authentication("Invalid username or password".to_string());

        let record = self
            .find_by_username(username.trim())
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &record.password_hash).await? {
            return Err(invalid());
        }

        Ok(record.profile)
    }

    pub async fn get_profile(&self, id: i64) -> AppResult<Option<AdminProfile>> {
        let row = sqlx::query("SELECT id, username, role, created_at FROM admins WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.map(|row| profile_from_row(&row)).transpose()
    }

    /// List all admins, oldest first
    pub async fn list(&self) -> AppResult<Vec<AdminProfile>> {
        let rows = sqlx::query("SELECT id, username, role, created_at FROM admins ORDER BY id ASC")
            .fetch_all(&self.db)
            .await?;

        rows.iter().map(profile_from_row).collect()
    }

    pub async fn count(&self) -> AppResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.db)
            .await?)
    }

    /// Create a regular admin
    pub async fn create(&self, username: Option<&str>, password: Option<&str>) -> AppResult<AdminProfile> {
        let username = validation::trimmed(username).ok_or_else(|| {
            AppError::Validation("Username and password are required".to_string())
        })?;
        let password = validation::password(password)?;

        let hash = hash_password(password).await?;

        let result = sqlx::query("INSERT INTO admins (username, password, role) VALUES (?, ?, ?)")
            .bind(&username)
            .bind(&hash)
            .bind(Role::Admin.as_str())
            .execute(&self.db)
            .await
            .map_err(|e| {
                db::classify_write_error(e, "Username already exists", "Admin not found")
            })?;

        self.get_profile(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::Internal("Created admin vanished".to_string()))
    }

    /// Replace an admin's password. Returns the target.
    pub async fn reset_password(&self, id: i64, password: Option<&str>) -> AppResult<AdminProfile> {
        let password = validation::password(password)?;

        let target = self
            .get_profile(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

        let hash = hash_password(password).await?;
        sqlx::query("UPDATE admins SET password = ? WHERE id = ?")
            .bind(&hash)
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(target)
    }

    /// Delete a regular admin. Superadmins are never deleted.
    pub async fn delete(&self, id: i64) -> AppResult<AdminProfile> {
        let target = self
            .get_profile(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

        if target.role == Role::SuperAdmin {
            return Err(AppError::Authorization(
                "The super admin cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM admins WHERE id = ? AND role != ?")
            .bind(id)
            .bind(Role::SuperAdmin.as_str())
            .execute(&self.db)
            .await?;

        Ok(target)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<AdminRecord>> {
        let row = sqlx::query(
            "SELECT id, username, password, role, created_at FROM admins WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => Ok(Some(AdminRecord {
                profile: profile_from_row(&row)?,
                password_hash: row.try_get("password")?,
            })),
            None => Ok(None),
        }
    }
}

fn profile_from_row(row: &SqliteRow) -> AppResult<AdminProfile> {
    let role_str: String = row.try_get("role")?;

    Ok(AdminProfile {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        role: role_str.parse()?,
        created_at: row.try_get("created_at")?,
    })
}
