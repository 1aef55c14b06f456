use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::notifications::SqliteNotificationStore;
use crate::points::{SqlitePointRepository, UndoTracker};
use crate::users::SqliteUserRepository;
use crate::storage::{LocalObjectStore, ObjectStore};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub images: Arc<dyn ObjectStore>,
    pub undo: Arc<Mutex<UndoTracker>>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let images = Arc::new(LocalObjectStore::new(config.uploads_path()));
        let undo = UndoTracker::new(std::time::Duration::from_secs(
            config.points.undo_window_secs,
        ));

        Self {
            db,
            config,
            images,
            undo: Arc::new(Mutex::new(undo)),
        }
    }
}

impl AppState {
    pub fn users(&self) -> SqliteUserRepository {
        SqliteUserRepository::with_cost(self.db.clone(), self.config.auth.bcrypt_cost)
    }

    pub fn points(&self) -> SqlitePointRepository {
        SqlitePointRepository::new(self.db.clone())
    }

    pub fn notifications(&self) -> SqliteNotificationStore {
        SqliteNotificationStore::new(self.db.clone(), self.config.points.notification_cap)
    }
}
