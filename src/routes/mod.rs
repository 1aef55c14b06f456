pub mod admin;
pub mod assets;
pub mod auth;
pub mod home;
pub mod logs;
pub mod map;
pub mod notifications;
pub mod owner;
pub mod preferences;
pub mod seller;

use axum::routing::get;
use axum::Router;

use crate::config::Config;
use crate::state::AppState;

/// All page and asset routes, before state and middleware are attached.
pub fn router(config: &Config) -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .route("/uploads/{name}", get(assets::upload))
        .merge(auth::router())
        .merge(owner::router(config.max_upload_bytes()))
        .merge(seller::router())
        .merge(map::router())
        .merge(logs::router())
        .merge(notifications::router())
        .merge(admin::router())
        .merge(preferences::router())
}
