use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::extractors::MaybeUser;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Send signed-in users to their role's landing page, everyone else to login.
pub async fn index(maybe_user: MaybeUser) -> Redirect {
    match maybe_user.0 {
        Some(user) => Redirect::to(user.role.home_path()),
        None => Redirect::to("/login"),
    }
}

/// Build a redirect to `path` carrying the non-empty query pairs.
pub fn redirect_with_query(path: &str, pairs: &[(&str, &str)]) -> Redirect {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs.iter().filter(|(_, v)| !v.is_empty()) {
        query.append_pair(key, value);
    }
    let query = query.finish();

    if query.is_empty() {
        Redirect::to(path)
    } else {
        Redirect::to(&format!("{}?{}", path, query))
    }
}

/// Confirmation fields are filled in by the page script after the user agrees.
pub fn confirmed(field: Option<&str>) -> bool {
    field == Some("yes")
}
