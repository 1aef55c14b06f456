use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

use crate::state::AppState;
use crate::storage::StorageError;

#[derive(Embed)]
#[folder = "assets/"]
struct Assets;

fn with_type(path: &str, cache: &'static str, body: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, cache.to_string()),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        body,
    )
        .into_response()
}

/// Embedded stylesheet and script.
pub async fn serve(Path(path): Path<String>) -> Response {
    match Assets::get(&path) {
        Some(file) => with_type(&path, "public, max-age=86400", file.data.to_vec()),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Uploaded images. Object names never change, so they cache for a long time.
pub async fn upload(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.images.get(&name).await {
        Ok(Some(bytes)) => with_type(&name, "public, max-age=31536000, immutable", bytes),
        Ok(None) | Err(StorageError::InvalidKey(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("Failed to read upload {}: {}", name, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
