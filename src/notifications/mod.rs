// Per-user notification feed, capped to the newest entries
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use rusqlite::{params, Row};
use serde::Serialize;

use crate::db::{self, RepositoryError};
use crate::state::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewProduct,
    ProductSold,
    UserAdded,
    Other,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewProduct => "new_product",
            NotificationKind::ProductSold => "product_sold",
            NotificationKind::UserAdded => "user_added",
            NotificationKind::Other => "other",
        }
    }

    /// Glyph shown next to the entry.
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationKind::NewProduct => "📦",
            NotificationKind::ProductSold => "✅",
            NotificationKind::UserAdded => "👤",
            NotificationKind::Other => "🔔",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "new_product" => NotificationKind::NewProduct,
            "product_sold" => NotificationKind::ProductSold,
            "user_added" => NotificationKind::UserAdded,
            _ => NotificationKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: i64,
    pub kind: NotificationKind,
    pub message: String,
    pub time: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    pub fn time_display(&self) -> String {
        self.time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Read-state tabs on the notifications page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl ReadFilter {
    pub const ALL: [ReadFilter; 3] = [ReadFilter::All, ReadFilter::Unread, ReadFilter::Read];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(ReadFilter::All),
            "unread" => Some(ReadFilter::Unread),
            "read" => Some(ReadFilter::Read),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadFilter::All => "all",
            ReadFilter::Unread => "unread",
            ReadFilter::Read => "read",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReadFilter::All => "All",
            ReadFilter::Unread => "Unread",
            ReadFilter::Read => "Read",
        }
    }

    pub fn matches(&self, n: &Notification) -> bool {
        match self {
            ReadFilter::All => true,
            ReadFilter::Unread => !n.read,
            ReadFilter::Read => n.read,
        }
    }
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Add an unread entry to every active user's feed.
    async fn broadcast(&self, kind: NotificationKind, message: &str) -> Result<(), RepositoryError>;

    async fn append(&self, user_id: &str, kind: NotificationKind, message: &str) -> Result<Notification, RepositoryError>;

    /// Newest first.
    async fn list(&self, user_id: &str) -> Result<Vec<Notification>, RepositoryError>;

    async fn unread_count(&self, user_id: &str) -> Result<i64, RepositoryError>;

    async fn mark_read(&self, user_id: &str, id: i64) -> Result<bool, RepositoryError>;

    async fn mark_all_read(&self, user_id: &str) -> Result<usize, RepositoryError>;

    async fn delete(&self, user_id: &str, id: i64) -> Result<bool, RepositoryError>;

    async fn clear(&self, user_id: &str) -> Result<usize, RepositoryError>;
}

pub struct SqliteNotificationStore {
    pool: DbPool,
    cap: usize,
}

impl SqliteNotificationStore {
    pub fn new(pool: DbPool, cap: usize) -> Self {
        Self { pool, cap }
    }

    fn trim(&self, conn: &rusqlite::Connection, user_id: &str) -> rusqlite::Result<usize> {
        conn.execute(
            "DELETE FROM notifications WHERE user_id = ?1 AND id NOT IN
             (SELECT id FROM notifications WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2)",
            params![user_id, self.cap as i64],
        )
    }
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let kind: String = row.get(1)?;
    let time: String = row.get(3)?;
    Ok(Notification {
        id: row.get(0)?,
        kind: NotificationKind::parse(&kind),
        message: row.get(2)?,
        time: db::parse_timestamp(&time).unwrap_or_default(),
        read: row.get(4)?,
    })
}

#[async_trait]
impl NotificationStore for SqliteNotificationStore {
    async fn broadcast(&self, kind: NotificationKind, message: &str) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get()?;
        let now = db::timestamp(Utc::now());

        let tx = conn.transaction()?;
        let recipients: Vec<String> = {
            let mut stmt = tx.prepare("SELECT id FROM users WHERE is_active = 1")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };
        for user_id in &recipients {
            tx.execute(
                "INSERT INTO notifications (user_id, kind, message, time, read, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?4)",
                params![user_id, kind.as_str(), message, now],
            )?;
            self.trim(&tx, user_id)?;
        }
        tx.commit()?;

        tracing::debug!(recipients = recipients.len(), "Broadcast notification: {}", message);
        Ok(())
    }

    async fn append(&self, user_id: &str, kind: NotificationKind, message: &str) -> Result<Notification, RepositoryError> {
        let mut conn = self.pool.get()?;
        let time = Utc::now();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO notifications (user_id, kind, message, time, read, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?4)",
            params![user_id, kind.as_str(), message, db::timestamp(time)],
        )?;
        let id = tx.last_insert_rowid();
        self.trim(&tx, user_id)?;
        tx.commit()?;

        Ok(Notification {
            id,
            kind,
            message: message.to_string(),
            time,
            read: false,
        })
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Notification>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, kind, message, time, read FROM notifications
             WHERE user_id = ?1 ORDER BY id DESC",
        )?;
        let items = stmt
            .query_map(params![user_id], notification_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    async fn unread_count(&self, user_id: &str) -> Result<i64, RepositoryError> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn mark_read(&self, user_id: &str, id: i64) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND id = ?2",
            params![user_id, id],
        )?;
        Ok(rows > 0)
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<usize, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0",
            params![user_id],
        )?;
        Ok(rows)
    }

    async fn delete(&self, user_id: &str, id: i64) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "DELETE FROM notifications WHERE user_id = ?1 AND id = ?2",
            params![user_id, id],
        )?;
        Ok(rows > 0)
    }

    async fn clear(&self, user_id: &str) -> Result<usize, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM notifications WHERE user_id = ?1", params![user_id])?;
        Ok(rows)
    }
}
