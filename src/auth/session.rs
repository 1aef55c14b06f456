use chrono::{Duration, Utc};
use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::auth::role::Role;
use crate::db::{self, RepositoryError};
use crate::state::DbPool;

/// Identity resolved from a live session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

/// Create a new session for a user. Returns the session token.
pub fn create_session(pool: &DbPool, user_id: &str, hours: u64) -> Result<String, RepositoryError> {
    let conn = pool.get()?;

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();
    let now = Utc::now();
    let expires_at = now + Duration::hours(hours as i64);

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, user_id, token, db::timestamp(expires_at), db::timestamp(now)],
    )?;

    Ok(token)
}

/// Resolve a token to its user. Expired sessions and deactivated users resolve to `None`.
pub fn lookup_session(pool: &DbPool, token: &str) -> Result<Option<SessionIdentity>, RepositoryError> {
    let conn = pool.get()?;
    let now = db::timestamp(Utc::now());

    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT u.id, u.username, u.role FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.token = ?1 AND s.expires_at > ?2 AND u.is_active = 1",
            params![token, now],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    Ok(row.and_then(|(user_id, username, role)| {
        let role = role.parse::<Role>().ok()?;
        Some(SessionIdentity {
            user_id,
            username,
            role,
        })
    }))
}

/// Delete a session by token.
pub fn delete_session(pool: &DbPool, token: &str) -> Result<(), RepositoryError> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Remove sessions past their expiry. Returns how many were deleted.
pub fn purge_expired(pool: &DbPool) -> Result<usize, RepositoryError> {
    let conn = pool.get()?;
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![db::timestamp(Utc::now())],
    )?;
    Ok(deleted)
}

pub fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
