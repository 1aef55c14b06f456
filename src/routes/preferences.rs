use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse, Redirect};
use axum::routing::post;
use axum::{Form, Router};
use serde::Deserialize;

use crate::extractors::{Preferences, DARK_MODE_COOKIE};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/preferences/dark-mode", post(toggle_dark_mode))
}

#[derive(Deserialize, Default)]
pub struct ToggleForm {
    pub return_to: Option<String>,
}

/// Only same-site paths are followed after the toggle.
fn safe_return_path(raw: Option<&str>) -> &str {
    match raw {
        Some(path) if path.starts_with('/') && !matches!(path.as_bytes().get(1), Some(b'/' | b'\\')) => path,
        _ => "/",
    }
}

fn dark_mode_cookie(enabled: bool) -> String {
    format!(
        "{}={}; SameSite=Lax; Path=/; Max-Age={}",
        DARK_MODE_COOKIE,
        if enabled { "1" } else { "0" },
        365 * 24 * 3600
    )
}

pub async fn toggle_dark_mode(prefs: Preferences, Form(form): Form<ToggleForm>) -> impl IntoResponse {
    (
        AppendHeaders([(header::SET_COOKIE, dark_mode_cookie(!prefs.dark_mode))]),
        Redirect::to(safe_return_path(form.return_to.as_deref())),
    )
}
