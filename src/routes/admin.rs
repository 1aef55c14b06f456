use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::auth::role::{require_role, Gate, Role, MANAGERS};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Preferences};
use crate::notifications::{NotificationKind, NotificationStore};
use crate::routes::home::{confirmed, Html};
use crate::shell::{NavPage, Shell};
use crate::state::AppState;
use crate::users::{NewUser, User, UserFilter, UserRepository, UserUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(page).post(create))
        .route("/admin/users/{id}", post(update))
        .route("/admin/users/{id}/toggle", post(toggle))
        .route("/admin/users/{id}/delete", post(delete))
}

#[derive(Template)]
#[template(path = "pages/admin_users.html")]
pub struct AdminUsersTemplate {
    pub shell: Shell,
    pub gate: Gate,
    pub roles: [Role; 3],
    pub users: Vec<User>,
    pub search: String,
    pub role_filter: String,
    pub editing: Option<User>,
    pub creating: bool,
    pub error: Option<String>,
    pub current_user_id: String,
}

#[derive(Deserialize, Default)]
pub struct AdminQuery {
    pub q: Option<String>,
    pub role: Option<String>,
    pub edit: Option<String>,
    pub new: Option<String>,
}

/// Read-only view: the gate degrades it for non-managers without refusing it.
pub async fn page(
    State(state): State<AppState>,
    user: CurrentUser,
    prefs: Preferences,
    Query(query): Query<AdminQuery>,
) -> Html<AdminUsersTemplate> {
    render(&state, &user, prefs, &query, None).await
}

async fn render(
    state: &AppState,
    user: &CurrentUser,
    prefs: Preferences,
    query: &AdminQuery,
    error: Option<String>,
) -> Html<AdminUsersTemplate> {
    let role = query.role.as_deref().and_then(|r| r.parse::<Role>().ok());
    let filter = UserFilter {
        search: query.q.clone(),
        role,
    };
    let repo = state.users();

    let users = match repo.list(&filter).await {
        Ok(users) => users,
        Err(e) => {
            tracing::error!("Failed to load users: {}", e);
            Vec::new()
        }
    };

    let editing = match query.edit.as_deref() {
        Some(id) => repo.get(id).await.unwrap_or_else(|e| {
            tracing::error!("Failed to load user {}: {}", id, e);
            None
        }),
        None => None,
    };

    Html(AdminUsersTemplate {
        shell: Shell::load(state, user, NavPage::Users, prefs).await,
        gate: Gate::check(MANAGERS, user.role),
        roles: Role::ALL,
        users,
        search: query.q.clone().unwrap_or_default(),
        role_filter: role.map(|r| r.as_str().to_string()).unwrap_or_default(),
        editing,
        creating: query.new.is_some(),
        error,
        current_user_id: user.id.clone(),
    })
}

#[derive(Deserialize)]
pub struct UserForm {
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub role: String,
    /// Checkbox: present when ticked.
    pub is_active: Option<String>,
}

impl UserForm {
    fn role(&self) -> AppResult<Role> {
        self.role
            .parse::<Role>()
            .map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

/// Re-render the page with the failed form's modal open, or pass other errors through.
async fn form_error(
    state: &AppState,
    user: &CurrentUser,
    prefs: Preferences,
    query: AdminQuery,
    err: AppError,
) -> AppResult<Response> {
    match err {
        AppError::BadRequest(msg) => {
            let page = render(state, user, prefs, &query, Some(msg)).await;
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        other => Err(other),
    }
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    prefs: Preferences,
    Form(form): Form<UserForm>,
) -> AppResult<Response> {
    require_role(MANAGERS, user.role)?;

    let result = async {
        let new_user = NewUser {
            username: form.username.clone(),
            password: form.password.clone(),
            role: form.role()?,
            is_active: form.is_active.is_some(),
        };
        Ok::<_, AppError>(state.users().create(&new_user).await?)
    }
    .await;

    let created = match result {
        Ok(created) => created,
        Err(e) => {
            let query = AdminQuery {
                new: Some("1".into()),
                ..Default::default()
            };
            return form_error(&state, &user, prefs, query, e).await;
        }
    };

    tracing::info!(by = %user.username, user = %created.username, role = %created.role, "User added");
    if let Err(e) = state
        .notifications()
        .append(
            &user.id,
            NotificationKind::UserAdded,
            &format!("User added: {}", created.username),
        )
        .await
    {
        tracing::error!("Failed to record notification: {}", e);
    }

    Ok(Redirect::to("/admin/users").into_response())
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    prefs: Preferences,
    Path(id): Path<String>,
    Form(form): Form<UserForm>,
) -> AppResult<Response> {
    require_role(MANAGERS, user.role)?;

    let result = async {
        let changes = UserUpdate {
            username: form.username.clone(),
            password: Some(form.password.clone()).filter(|p| !p.is_empty()),
            role: form.role()?,
            is_active: form.is_active.is_some(),
        };
        if id == user.id {
            if !changes.is_active {
                return Err(AppError::BadRequest("You cannot deactivate your own account".into()));
            }
            if changes.role != user.role {
                return Err(AppError::BadRequest("You cannot change your own role".into()));
            }
        }
        Ok::<_, AppError>(state.users().update(&id, &changes).await?)
    }
    .await;

    match result {
        Ok(updated) => {
            tracing::info!(by = %user.username, user = %updated.username, "User updated");
            Ok(Redirect::to("/admin/users").into_response())
        }
        Err(e) => {
            let query = AdminQuery {
                edit: Some(id.clone()),
                ..Default::default()
            };
            form_error(&state, &user, prefs, query, e).await
        }
    }
}

pub async fn toggle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    require_role(MANAGERS, user.role)?;
    if id == user.id {
        return Err(AppError::BadRequest("You cannot deactivate your own account".into()));
    }

    let repo = state.users();
    let target = repo.get(&id).await?.ok_or(AppError::NotFound)?;
    repo.set_active(&id, !target.is_active).await?;
    tracing::info!(by = %user.username, user = %target.username, active = !target.is_active, "User toggled");

    Ok(Redirect::to("/admin/users"))
}

#[derive(Deserialize, Default)]
pub struct DeleteForm {
    pub confirm: Option<String>,
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> AppResult<Redirect> {
    require_role(MANAGERS, user.role)?;
    if !confirmed(form.confirm.as_deref()) {
        return Err(AppError::BadRequest("Confirm the deletion first".into()));
    }
    if id == user.id {
        return Err(AppError::BadRequest("You cannot delete your own account".into()));
    }

    if !state.users().delete(&id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(by = %user.username, user = %id, "User deleted");

    Ok(Redirect::to("/admin/users"))
}
