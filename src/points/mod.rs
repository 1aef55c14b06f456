// Distribution points - domain, persistence and the create/sell/undo flows
pub mod domain;
pub mod filters;
pub mod repository;
pub mod undo;

use chrono::Utc;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::notifications::{NotificationKind, NotificationStore};
use crate::storage::{ImageUpload, ObjectStore, StorageError};

pub use domain::{
    DistributionPoint, LocationInput, NewPoint, PointDraft, PointError, PointStatus, ProductKind,
    ResolvedLocation, ValidDraft,
};
pub use filters::{LogRange, StatusFilter};
pub use repository::{PointQuery, PointRepository, SqlitePointRepository};
pub use undo::UndoTracker;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Point(#[from] PointError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Upload every image, then insert the point. Nothing is inserted unless all
/// uploads succeed; objects stored by a failed attempt are removed again.
pub async fn create_point(
    points: &dyn PointRepository,
    store: &dyn ObjectStore,
    notifications: &dyn NotificationStore,
    draft: ValidDraft,
    images: &[ImageUpload],
    created_by: &str,
) -> Result<DistributionPoint, LifecycleError> {
    if images.is_empty() {
        return Err(PointError::MissingImage.into());
    }

    let mut stored_keys = Vec::with_capacity(images.len());
    let mut urls = Vec::with_capacity(images.len());
    for image in images {
        let key = image.object_key();
        match store.put(&key, &image.bytes).await {
            Ok(url) => {
                stored_keys.push(key);
                urls.push(url);
            }
            Err(e) => {
                discard_uploads(store, &stored_keys).await;
                return Err(e.into());
            }
        }
    }

    let point = match points
        .insert(&NewPoint::from_draft(draft, urls, created_by))
        .await
    {
        Ok(point) => point,
        Err(e) => {
            discard_uploads(store, &stored_keys).await;
            return Err(e.into());
        }
    };

    tracing::info!(point = %point.id, images = images.len(), "Created point {}", point.display_name());
    notify(
        notifications,
        NotificationKind::NewProduct,
        &format!("New product: {}", point.display_name()),
    )
    .await;

    Ok(point)
}

/// Load, transition to sold, save.
pub async fn sell_point(
    points: &dyn PointRepository,
    notifications: &dyn NotificationStore,
    id: &str,
    sold_by: &str,
) -> Result<DistributionPoint, LifecycleError> {
    let point = load(points, id).await?;
    let sold = point.sell(sold_by, Utc::now())?;
    points.save_status(&sold).await?;

    tracing::info!(point = %sold.id, by = %sold_by, "Marked sold");
    notify(
        notifications,
        NotificationKind::ProductSold,
        &format!("Sold: {}", sold.display_name()),
    )
    .await;

    Ok(sold)
}

/// Load, transition back to active, save. The undo window is not checked here.
pub async fn undo_sale(points: &dyn PointRepository, id: &str) -> Result<DistributionPoint, LifecycleError> {
    let point = load(points, id).await?;
    let restored = point.revert_sale()?;
    points.save_status(&restored).await?;

    tracing::info!(point = %restored.id, "Sale undone");
    Ok(restored)
}

async fn load(points: &dyn PointRepository, id: &str) -> Result<DistributionPoint, LifecycleError> {
    points
        .get(id)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("point {}", id)).into())
}

async fn discard_uploads(store: &dyn ObjectStore, keys: &[String]) {
    for key in keys {
        if let Err(e) = store.delete(key).await {
            tracing::warn!("Failed to remove orphaned upload {}: {}", key, e);
        }
    }
}

/// Notifications are secondary to the write that triggered them.
async fn notify(notifications: &dyn NotificationStore, kind: NotificationKind, message: &str) {
    if let Err(e) = notifications.broadcast(kind, message).await {
        tracing::error!("Failed to record notification: {}", e);
    }
}
