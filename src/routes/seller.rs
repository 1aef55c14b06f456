use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Preferences};
use crate::points::{self, DistributionPoint, PointQuery, PointRepository, StatusFilter};
use crate::routes::home::{confirmed, redirect_with_query, Html};
use crate::shell::{NavPage, Shell};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/seller", get(page))
        .route("/seller/points/{id}/sell", post(sell))
        .route("/seller/points/{id}/undo", post(undo))
}

#[derive(Template)]
#[template(path = "pages/seller.html")]
pub struct SellerTemplate {
    pub shell: Shell,
    pub filters: [StatusFilter; 3],
    pub filter: StatusFilter,
    pub search: String,
    pub points: Vec<DistributionPoint>,
    /// Point whose sale this session may still undo; empty when none.
    pub undo_id: String,
    pub undo_secs: u64,
}

#[derive(Deserialize, Default)]
pub struct SellerQuery {
    pub filter: Option<String>,
    pub q: Option<String>,
}

pub async fn page(
    State(state): State<AppState>,
    user: CurrentUser,
    prefs: Preferences,
    Query(query): Query<SellerQuery>,
) -> Html<SellerTemplate> {
    let filter = query
        .filter
        .as_deref()
        .and_then(StatusFilter::parse)
        .unwrap_or_default();
    let search = query.q.unwrap_or_default();

    let points = match state
        .points()
        .list(&PointQuery {
            status: filter.status(),
            created_since: None,
        })
        .await
    {
        Ok(points) => points.into_iter().filter(|p| p.matches_search(&search)).collect(),
        Err(e) => {
            tracing::error!("Failed to load points: {}", e);
            Vec::new()
        }
    };

    let (undo_id, undo_secs) = {
        let mut undo = state.undo.lock().await;
        match undo.pending(&user.session_token) {
            Some(id) => {
                let secs = undo.remaining_secs(&user.session_token).unwrap_or(0);
                (id, secs)
            }
            None => (String::new(), 0),
        }
    };

    Html(SellerTemplate {
        shell: Shell::load(&state, &user, NavPage::Home, prefs).await,
        filters: StatusFilter::ALL,
        filter,
        search,
        points,
        undo_id,
        undo_secs,
    })
}

/// Sale actions post back the list state so the redirect lands on the same view.
#[derive(Deserialize, Default)]
pub struct SaleForm {
    pub confirm: Option<String>,
    pub filter: Option<String>,
    pub q: Option<String>,
}

impl SaleForm {
    fn back(&self) -> Redirect {
        redirect_with_query(
            "/seller",
            &[
                ("filter", self.filter.as_deref().unwrap_or_default()),
                ("q", self.q.as_deref().unwrap_or_default()),
            ],
        )
    }
}

pub async fn sell(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<SaleForm>,
) -> AppResult<Redirect> {
    if !confirmed(form.confirm.as_deref()) {
        return Err(AppError::BadRequest("Confirm the sale first".into()));
    }

    let sold = points::sell_point(&state.points(), &state.notifications(), &id, &user.id).await?;
    state.undo.lock().await.record(&user.session_token, &sold.id);

    Ok(form.back())
}

pub async fn undo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<SaleForm>,
) -> AppResult<Redirect> {
    let restored = points::undo_sale(&state.points(), &id).await?;
    state.undo.lock().await.clear(&user.session_token, &restored.id);

    Ok(form.back())
}
