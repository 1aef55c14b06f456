// User accounts - domain types and the SQLite repository
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::role::Role;
use crate::db::{self, RepositoryError};
use crate::state::DbPool;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
}

impl User {
    /// Date part of `created_at`.
    pub fn created_on(&self) -> &str {
        self.created_at.get(..10).unwrap_or(&self.created_at)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub is_active: bool,
}

/// Changes applied by the admin edit form. A `None` password keeps the old one.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub username: String,
    pub password: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        let role_ok = self.role.map(|r| r == user.role).unwrap_or(true);
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => user.username.to_lowercase().contains(&q.to_lowercase()),
            _ => true,
        };
        role_ok && search_ok
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Check credentials. Inactive users and wrong passwords yield `None`.
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, RepositoryError>;

    async fn get(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;

    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn update(&self, id: &str, update: &UserUpdate) -> Result<User, RepositoryError>;

    async fn set_active(&self, id: &str, active: bool) -> Result<(), RepositoryError>;

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;
}

pub struct SqliteUserRepository {
    pool: DbPool,
    cost: u32,
}

impl SqliteUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self::with_cost(pool, bcrypt::DEFAULT_COST)
    }

    pub fn with_cost(pool: DbPool, cost: u32) -> Self {
        Self { pool, cost }
    }
}

const USER_COLUMNS: &str = "id, username, role, is_active, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(2)?;
    let role = role.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        role,
        is_active: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn username_conflict(err: rusqlite::Error, username: &str) -> RepositoryError {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            RepositoryError::Conflict(format!("Username '{}' is already taken", username))
        }
        other => other.into(),
    }
}

fn validate_username(username: &str) -> Result<String, RepositoryError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(RepositoryError::Validation("Username is required".into()));
    }
    Ok(username.to_string())
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;

        let found: Option<(User, String)> = conn
            .query_row(
                &format!(
                    "SELECT {}, password_hash FROM users WHERE username = ?1 AND is_active = 1",
                    USER_COLUMNS
                ),
                params![username.trim()],
                |row| Ok((user_from_row(row)?, row.get(5)?)),
            )
            .optional()?;

        Ok(found.and_then(|(user, hash)| verify_password(password, &hash).then_some(user)))
    }

    async fn get(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC, rowid DESC",
            USER_COLUMNS
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users.into_iter().filter(|u| filter.matches(u)).collect())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let conn = self.pool.get()?;
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let username = validate_username(&user.username)?;
        if user.password.is_empty() {
            return Err(RepositoryError::Validation("Password is required".into()));
        }

        let hash = hash_password(&user.password, self.cost)?;
        let id = uuid::Uuid::now_v7().to_string();
        let created_at = db::timestamp(Utc::now());

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (id, username, password_hash, role, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, username, hash, user.role.as_str(), user.is_active, created_at],
        )
        .map_err(|e| username_conflict(e, &username))?;

        Ok(User {
            id,
            username,
            role: user.role,
            is_active: user.is_active,
            created_at,
        })
    }

    async fn update(&self, id: &str, update: &UserUpdate) -> Result<User, RepositoryError> {
        let username = validate_username(&update.username)?;
        let new_hash = match update.password.as_deref() {
            Some(pw) if !pw.is_empty() => Some(hash_password(pw, self.cost)?),
            _ => None,
        };

        let conn = self.pool.get()?;
        let changed = match new_hash {
            Some(hash) => conn.execute(
                "UPDATE users SET username = ?1, role = ?2, is_active = ?3, password_hash = ?4 WHERE id = ?5",
                params![username, update.role.as_str(), update.is_active, hash, id],
            ),
            None => conn.execute(
                "UPDATE users SET username = ?1, role = ?2, is_active = ?3 WHERE id = ?4",
                params![username, update.role.as_str(), update.is_active, id],
            ),
        }
        .map_err(|e| username_conflict(e, &username))?;

        if changed == 0 {
            return Err(RepositoryError::NotFound(format!("user {}", id)));
        }

        drop(conn);
        self.get(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("user {}", id)))
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE users SET is_active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}

/// Create the first owner account when no users exist yet.
/// Returns true when an account was created.
pub async fn ensure_bootstrap_owner(
    repo: &dyn UserRepository,
    username: &str,
    password: &str,
) -> Result<bool, RepositoryError> {
    if repo.count().await? > 0 {
        return Ok(false);
    }

    repo.create(&NewUser {
        username: username.to_string(),
        password: password.to_string(),
        role: Role::Owner,
        is_active: true,
    })
    .await?;

    tracing::warn!(
        "Created bootstrap owner account '{}'; change its password from the users page",
        username
    );
    Ok(true)
}
