use askama::Template;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Local;
use serde::Deserialize;

use crate::auth::role::{require_role, Gate, Role, CREATORS};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Preferences};
use crate::geo::Coordinates;
use crate::points::filters::start_of_day;
use crate::points::{
    self, DistributionPoint, LocationInput, PointDraft, PointQuery, PointRepository, ProductKind,
};
use crate::routes::home::Html;
use crate::shell::{NavPage, Shell};
use crate::state::AppState;
use crate::storage::ImageUpload;

pub fn router(upload_limit: usize) -> Router<AppState> {
    Router::new().route("/owner", get(page)).route(
        "/owner/points",
        post(create).layer(DefaultBodyLimit::max(upload_limit)),
    )
}

/// What the create form shows, kept across a failed submission.
#[derive(Debug, Clone)]
pub struct FormView {
    pub product_type: String,
    pub product_value: String,
    pub location_mode: String,
    pub latitude: String,
    pub longitude: String,
    pub location_url: String,
    pub previews: Vec<String>,
}

impl Default for FormView {
    fn default() -> Self {
        Self {
            product_type: ProductKind::Half.as_str().to_string(),
            product_value: String::new(),
            location_mode: "current".to_string(),
            latitude: String::new(),
            longitude: String::new(),
            location_url: String::new(),
            previews: Vec::new(),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/owner.html")]
pub struct OwnerTemplate {
    pub shell: Shell,
    pub gate: Gate,
    pub kinds: [ProductKind; 3],
    pub form: FormView,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub today: Vec<DistributionPoint>,
    pub today_total: usize,
    pub search: String,
}

#[derive(Deserialize, Default)]
pub struct OwnerQuery {
    pub q: Option<String>,
    pub created: Option<String>,
}

pub async fn page(
    State(state): State<AppState>,
    user: CurrentUser,
    prefs: Preferences,
    Query(query): Query<OwnerQuery>,
) -> Response {
    if user.role != Role::Owner {
        return Redirect::to(user.role.home_path()).into_response();
    }

    let notice = query
        .created
        .is_some()
        .then(|| "Product added".to_string());
    let search = query.q.unwrap_or_default();

    render(&state, &user, prefs, FormView::default(), None, notice, search)
        .await
        .into_response()
}

async fn render(
    state: &AppState,
    user: &CurrentUser,
    prefs: Preferences,
    form: FormView,
    error: Option<String>,
    notice: Option<String>,
    search: String,
) -> Html<OwnerTemplate> {
    let since = start_of_day(&Local::now());
    let today = match state
        .points()
        .list(&PointQuery {
            status: None,
            created_since: since,
        })
        .await
    {
        Ok(points) => points,
        Err(e) => {
            tracing::error!("Failed to load today's points: {}", e);
            Vec::new()
        }
    };
    let today_total = today.len();
    let today = today
        .into_iter()
        .filter(|p| p.matches_search(&search))
        .collect();

    Html(OwnerTemplate {
        shell: Shell::load(state, user, NavPage::Home, prefs).await,
        gate: Gate::check(CREATORS, user.role),
        kinds: ProductKind::ALL,
        form,
        error,
        notice,
        today,
        today_total,
        search,
    })
}

/// Raw create-form submission.
#[derive(Default)]
struct CreateForm {
    product_type: String,
    product_value: String,
    location_mode: String,
    latitude: String,
    longitude: String,
    location_url: String,
    images: Vec<ImageUpload>,
}

impl CreateForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = CreateForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "images" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    // An untouched file input still submits one empty part
                    if filename.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.images.push(ImageUpload::from_file(
                        &filename,
                        content_type.as_deref(),
                        bytes.to_vec(),
                    )?);
                }
                _ => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    match name.as_str() {
                        "pasted_images" if !value.trim().is_empty() => {
                            form.images.push(ImageUpload::from_data_url(&value)?)
                        }
                        "product_type" => form.product_type = value,
                        "product_value" => form.product_value = value,
                        "location_mode" => form.location_mode = value,
                        "latitude" => form.latitude = value,
                        "longitude" => form.longitude = value,
                        "location_url" => form.location_url = value,
                        _ => {}
                    }
                }
            }
        }

        Ok(form)
    }

    fn location(&self) -> LocationInput {
        if self.location_mode == "manual" {
            LocationInput::Manual(self.location_url.clone())
        } else {
            let fix = Coordinates::from_parts(
                self.latitude.trim().parse().ok(),
                self.longitude.trim().parse().ok(),
            );
            LocationInput::Current(fix)
        }
    }

    fn view(&self) -> FormView {
        FormView {
            product_type: self.product_type.clone(),
            product_value: self.product_value.clone(),
            location_mode: if self.location_mode == "manual" {
                "manual".into()
            } else {
                "current".into()
            },
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
            location_url: self.location_url.clone(),
            previews: self.images.iter().map(ImageUpload::preview_data_url).collect(),
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    prefs: Preferences,
    multipart: Multipart,
) -> AppResult<Response> {
    require_role(CREATORS, user.role)?;

    let form = CreateForm::read(multipart).await?;
    let draft = form
        .product_type
        .parse::<ProductKind>()
        .and_then(|product_type| {
            PointDraft {
                product_type,
                product_value: form.product_value.clone(),
                location: form.location(),
                image_count: form.images.len(),
            }
            .validate()
        });

    let draft = match draft {
        Ok(draft) => draft,
        Err(e) => {
            let page = render(
                &state,
                &user,
                prefs,
                form.view(),
                Some(e.to_string()),
                None,
                String::new(),
            )
            .await;
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
    };

    points::create_point(
        &state.points(),
        state.images.as_ref(),
        &state.notifications(),
        draft,
        &form.images,
        &user.id,
    )
    .await?;

    Ok(Redirect::to("/owner?created=1").into_response())
}
