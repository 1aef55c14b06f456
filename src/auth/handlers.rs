use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::session;
use crate::error::AppResult;
use crate::extractors::{MaybeUser, Preferences};
use crate::routes::home::Html;
use crate::state::AppState;
use crate::users::UserRepository;

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub username: String,
    pub error: Option<String>,
    pub dark_mode: bool,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login_page(maybe_user: MaybeUser, prefs: Preferences) -> Response {
    if let Some(user) = maybe_user.0 {
        return Redirect::to(user.role.home_path()).into_response();
    }

    Html(LoginTemplate {
        username: String::new(),
        error: None,
        dark_mode: prefs.dark_mode,
    })
    .into_response()
}

pub async fn login(
    State(state): State<AppState>,
    prefs: Preferences,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let user = state
        .users()
        .authenticate(&form.username, &form.password)
        .await?;

    let Some(user) = user else {
        tracing::info!(username = %form.username.trim(), "Failed login");
        let page = LoginTemplate {
            username: form.username.trim().to_string(),
            error: Some("Wrong username or password".into()),
            dark_mode: prefs.dark_mode,
        };
        return Ok((StatusCode::UNAUTHORIZED, Html(page)).into_response());
    };

    let hours = state.config.auth.session_hours;
    let token = session::create_session(&state.db, &user.id, hours)?;
    tracing::info!(user = %user.username, role = %user.role, "Logged in");

    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            session::session_cookie(&state.config.auth.cookie_name, &token, hours),
        )]),
        Redirect::to(user.role.home_path()),
    )
        .into_response())
}

pub async fn logout(State(state): State<AppState>, maybe_user: MaybeUser) -> AppResult<Response> {
    if let Some(user) = maybe_user.0 {
        session::delete_session(&state.db, &user.session_token)?;
        tracing::info!(user = %user.username, "Logged out");
    }

    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            session::clear_session_cookie(&state.config.auth.cookie_name),
        )]),
        Redirect::to("/login"),
    )
        .into_response())
}
