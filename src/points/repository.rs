use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::domain::{DistributionPoint, NewPoint, PointStatus, ProductKind};
use crate::db::{self, RepositoryError};
use crate::state::DbPool;

/// Selection for point listings. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct PointQuery {
    pub status: Option<PointStatus>,
    pub created_since: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait PointRepository: Send + Sync {
    async fn insert(&self, point: &NewPoint) -> Result<DistributionPoint, RepositoryError>;

    async fn get(&self, id: &str) -> Result<Option<DistributionPoint>, RepositoryError>;

    /// Points ordered by `created_at` descending.
    async fn list(&self, query: &PointQuery) -> Result<Vec<DistributionPoint>, RepositoryError>;

    /// Sold points ordered by `sold_at` descending.
    async fn list_sold(&self, since: Option<DateTime<Utc>>) -> Result<Vec<DistributionPoint>, RepositoryError>;

    /// Persist the status and sale stamps of a point loaded earlier.
    async fn save_status(&self, point: &DistributionPoint) -> Result<(), RepositoryError>;
}

pub struct SqlitePointRepository {
    pool: DbPool,
}

impl SqlitePointRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const POINT_COLUMNS: &str = "id, product_type, product_value, latitude, longitude, location_url, \
     image_url, images, status, created_by, sold_by, created_at, sold_at";

fn conversion_error(col: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(err))
}

fn point_from_row(row: &Row<'_>) -> rusqlite::Result<DistributionPoint> {
    let product_type: String = row.get(1)?;
    let product_type = product_type
        .parse::<ProductKind>()
        .map_err(|e| conversion_error(1, e))?;

    let images: String = row.get(7)?;
    let images: Vec<String> = serde_json::from_str(&images).map_err(|e| conversion_error(7, e))?;

    let status: String = row.get(8)?;
    let status = status.parse::<PointStatus>().map_err(|e| conversion_error(8, e))?;

    let created_at: String = row.get(11)?;
    let sold_at: Option<String> = row.get(12)?;

    Ok(DistributionPoint {
        id: row.get(0)?,
        product_type,
        product_value: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        location_url: row.get(5)?,
        image_url: row.get(6)?,
        images,
        status,
        created_by: row.get(9)?,
        sold_by: row.get(10)?,
        created_at: db::parse_timestamp(&created_at).unwrap_or_default(),
        sold_at: sold_at.as_deref().and_then(db::parse_timestamp),
    })
}

#[async_trait]
impl PointRepository for SqlitePointRepository {
    async fn insert(&self, point: &NewPoint) -> Result<DistributionPoint, RepositoryError> {
        let image_url = point
            .images
            .first()
            .cloned()
            .ok_or_else(|| RepositoryError::Validation("A point needs at least one image".into()))?;

        let id = uuid::Uuid::now_v7().to_string();
        let created_at = Utc::now();
        let images = serde_json::to_string(&point.images)?;
        let coords = point.location.coordinates;

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO distribution_points
             (id, product_type, product_value, latitude, longitude, location_url,
              image_url, images, status, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'active', ?9, ?10)",
            params![
                id,
                point.product_type.as_str(),
                point.product_value,
                coords.map(|c| c.latitude),
                coords.map(|c| c.longitude),
                point.location.url,
                image_url,
                images,
                point.created_by,
                db::timestamp(created_at),
            ],
        )?;

        Ok(DistributionPoint {
            id,
            product_type: point.product_type,
            product_value: point.product_value.clone(),
            images: point.images.clone(),
            image_url,
            latitude: coords.map(|c| c.latitude),
            longitude: coords.map(|c| c.longitude),
            location_url: point.location.url.clone(),
            status: PointStatus::Active,
            created_by: point.created_by.clone(),
            sold_by: None,
            created_at,
            sold_at: None,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<DistributionPoint>, RepositoryError> {
        let conn = self.pool.get()?;
        let point = conn
            .query_row(
                &format!("SELECT {} FROM distribution_points WHERE id = ?1", POINT_COLUMNS),
                params![id],
                point_from_row,
            )
            .optional()?;
        Ok(point)
    }

    async fn list(&self, query: &PointQuery) -> Result<Vec<DistributionPoint>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM distribution_points
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR created_at >= ?2)
             ORDER BY created_at DESC, rowid DESC",
            POINT_COLUMNS
        ))?;
        let points = stmt
            .query_map(
                params![
                    query.status.map(|s| s.as_str()),
                    query.created_since.map(db::timestamp)
                ],
                point_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(points)
    }

    async fn list_sold(&self, since: Option<DateTime<Utc>>) -> Result<Vec<DistributionPoint>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM distribution_points
             WHERE status = 'sold' AND sold_at IS NOT NULL AND (?1 IS NULL OR sold_at >= ?1)
             ORDER BY sold_at DESC, rowid DESC",
            POINT_COLUMNS
        ))?;
        let points = stmt
            .query_map(params![since.map(db::timestamp)], point_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(points)
    }

    async fn save_status(&self, point: &DistributionPoint) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE distribution_points SET status = ?1, sold_by = ?2, sold_at = ?3 WHERE id = ?4",
            params![
                point.status.as_str(),
                point.sold_by,
                point.sold_at.map(db::timestamp),
                point.id
            ],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound(format!("point {}", point.id)));
        }
        Ok(())
    }
}
