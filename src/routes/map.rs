use askama::Template;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::extractors::{CurrentUser, Preferences};
use crate::geo::{format_km, rank_by_distance, Coordinates};
use crate::points::{DistributionPoint, PointQuery, PointRepository, StatusFilter};
use crate::routes::home::Html;
use crate::shell::{NavPage, Shell};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/map", get(page))
}

pub struct MapEntry {
    pub point: DistributionPoint,
    /// Formatted distance, empty when unknown.
    pub distance: String,
}

#[derive(Template)]
#[template(path = "pages/map.html")]
pub struct MapTemplate {
    pub shell: Shell,
    pub filters: [StatusFilter; 3],
    pub filter: StatusFilter,
    pub search: String,
    pub grid: bool,
    pub has_fix: bool,
    pub lat: String,
    pub lng: String,
    pub entries: Vec<MapEntry>,
}

/// Coordinates arrive as text so an empty field means "no fix" instead of a rejection.
#[derive(Deserialize, Default)]
pub struct MapQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub filter: Option<String>,
    pub q: Option<String>,
    pub view: Option<String>,
}

impl MapQuery {
    fn origin(&self) -> Option<Coordinates> {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        Coordinates::from_parts(parse(&self.lat), parse(&self.lng))
    }
}

pub async fn page(
    State(state): State<AppState>,
    user: CurrentUser,
    prefs: Preferences,
    Query(query): Query<MapQuery>,
) -> Html<MapTemplate> {
    let origin = query.origin();
    let filter = query
        .filter
        .as_deref()
        .and_then(StatusFilter::parse)
        .unwrap_or(StatusFilter::All);
    let search = query.q.clone().unwrap_or_default();

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
            tracing::error!("Failed to load points for map: {}", e);
            Vec::new()
        }
    };

    let entries = rank_by_distance(points, origin, DistributionPoint::coordinates)
        .into_iter()
        .map(|ranked| MapEntry {
            point: ranked.item,
            distance: ranked.distance_km.map(format_km).unwrap_or_default(),
        })
        .collect();

    Html(MapTemplate {
        shell: Shell::load(&state, &user, NavPage::Map, prefs).await,
        filters: StatusFilter::ALL,
        filter,
        search,
        grid: query.view.as_deref() == Some("grid"),
        has_fix: origin.is_some(),
        lat: origin.map(|c| c.latitude.to_string()).unwrap_or_default(),
        lng: origin.map(|c| c.longitude.to_string()).unwrap_or_default(),
        entries,
    })
}
