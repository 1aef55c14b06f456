use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Preferences};
use crate::notifications::{Notification, NotificationStore, ReadFilter};
use crate::routes::home::{confirmed, redirect_with_query, Html};
use crate::shell::{NavPage, Shell};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(page))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/clear", post(clear))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/{id}/delete", post(delete))
}

#[derive(Template)]
#[template(path = "pages/notifications.html")]
pub struct NotificationsTemplate {
    pub shell: Shell,
    pub filters: [ReadFilter; 3],
    pub filter: ReadFilter,
    pub items: Vec<Notification>,
    pub total: usize,
}

#[derive(Deserialize, Default)]
pub struct NotificationsQuery {
    pub filter: Option<String>,
}

pub async fn page(
    State(state): State<AppState>,
    user: CurrentUser,
    prefs: Preferences,
    Query(query): Query<NotificationsQuery>,
) -> Html<NotificationsTemplate> {
    let filter = query
        .filter
        .as_deref()
        .and_then(ReadFilter::parse)
        .unwrap_or_default();

    let all = match state.notifications().list(&user.id).await {
        Ok(items) => items,
        Err(e) => {
            tracing::error!("Failed to load notifications: {}", e);
            Vec::new()
        }
    };
    let total = all.len();
    let items = all.into_iter().filter(|n| filter.matches(n)).collect();

    Html(NotificationsTemplate {
        shell: Shell::load(&state, &user, NavPage::Notifications, prefs).await,
        filters: ReadFilter::ALL,
        filter,
        items,
        total,
    })
}

#[derive(Deserialize, Default)]
pub struct ActionForm {
    pub confirm: Option<String>,
    pub filter: Option<String>,
}

impl ActionForm {
    fn back(&self) -> Redirect {
        redirect_with_query(
            "/notifications",
            &[("filter", self.filter.as_deref().unwrap_or_default())],
        )
    }
}

pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<ActionForm>,
) -> AppResult<Redirect> {
    if !state.notifications().mark_read(&user.id, id).await? {
        return Err(AppError::NotFound);
    }
    Ok(form.back())
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<ActionForm>,
) -> AppResult<Redirect> {
    state.notifications().mark_all_read(&user.id).await?;
    Ok(form.back())
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<ActionForm>,
) -> AppResult<Redirect> {
    if !state.notifications().delete(&user.id, id).await? {
        return Err(AppError::NotFound);
    }
    Ok(form.back())
}

pub async fn clear(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<ActionForm>,
) -> AppResult<Redirect> {
    if !confirmed(form.confirm.as_deref()) {
        return Err(AppError::BadRequest("Confirm clearing all notifications first".into()));
    }
    let removed = state.notifications().clear(&user.id).await?;
    tracing::info!(user = %user.username, removed, "Cleared notifications");
    Ok(form.back())
}
