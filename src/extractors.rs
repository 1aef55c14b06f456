use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::auth::role::Role;
use crate::auth::session;
use crate::error::AppError;
use crate::state::AppState;

pub const DARK_MODE_COOKIE: &str = "dark_mode";

/// The signed-in user for this request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub session_token: String,
}

/// Extractor that requires a live session.
/// Anonymous requests are redirected to the login page.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = get_cookie_value(parts, &state.config.auth.cookie_name)
            .ok_or(AppError::LoginRequired)?
            .to_string();

        let identity = session::lookup_session(&state.db, &token)?.ok_or(AppError::LoginRequired)?;

        Ok(CurrentUser {
            id: identity.user_id,
            username: identity.username,
            role: identity.role,
            session_token: token,
        })
    }
}

/// Optional user extractor, for pages that also serve anonymous visitors.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::LoginRequired) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}

/// Display preferences carried in cookies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preferences {
    pub dark_mode: bool,
}

impl<S: Send + Sync> FromRequestParts<S> for Preferences {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Preferences {
            dark_mode: get_cookie_value(parts, DARK_MODE_COOKIE) == Some("1"),
        })
    }
}

/// Read a cookie value by name from the request headers.
pub fn get_cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let (key, val) = cookie.split_once('=')?;
            (key.trim() == name).then(|| val.trim())
        })
}
