use askama::Template;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use chrono::Local;
use serde::Deserialize;

use crate::extractors::{CurrentUser, Preferences};
use crate::points::filters::start_of_day;
use crate::points::{DistributionPoint, LogRange, PointRepository};
use crate::routes::home::Html;
use crate::shell::{NavPage, Shell};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/logs", get(page))
}

#[derive(Template)]
#[template(path = "pages/logs.html")]
pub struct LogsTemplate {
    pub shell: Shell,
    pub ranges: [LogRange; 4],
    pub range: LogRange,
    pub search: String,
    pub entries: Vec<DistributionPoint>,
    pub today_count: usize,
}

#[derive(Deserialize, Default)]
pub struct LogsQuery {
    pub range: Option<String>,
    pub q: Option<String>,
}

pub async fn page(
    State(state): State<AppState>,
    user: CurrentUser,
    prefs: Preferences,
    Query(query): Query<LogsQuery>,
) -> Html<LogsTemplate> {
    let range = query
        .range
        .as_deref()
        .and_then(LogRange::parse)
        .unwrap_or_default();
    let search = query.q.unwrap_or_default();
    let now = Local::now();
    let repo = state.points();

    let entries = match repo.list_sold(range.since(&now)).await {
        Ok(points) => points.into_iter().filter(|p| p.matches_search(&search)).collect(),
        Err(e) => {
            tracing::error!("Failed to load sales log: {}", e);
            Vec::new()
        }
    };

    let today_count = match repo.list_sold(start_of_day(&now)).await {
        Ok(points) => points.len(),
        Err(e) => {
            tracing::error!("Failed to count today's sales: {}", e);
            0
        }
    };

    Html(LogsTemplate {
        shell: Shell::load(&state, &user, NavPage::Logs, prefs).await,
        ranges: LogRange::ALL,
        range,
        search,
        entries,
        today_count,
    })
}
