//! Handlers for the `/project` resource.

use aoi_core::error::{CoreError, FieldError};
use aoi_core::pagination::{PageParams, PageRequest};
use aoi_core::project::{ProjectCreate, ProjectUpdate};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::form::{self, GeoJsonUpload, ProjectForm, AREA_FIELD, DATA_FIELD};
use crate::service::ProjectView;
use crate::state::AppState;

/// Response body for the paginated project listing.
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub results: Vec<ProjectView>,
    pub elements: usize,
    pub has_next_page: bool,
    pub page_size: i64,
    pub page: i64,
}

/// POST /v1/project
///
/// Multipart form with a `data` JSON part and an `area_of_interest` file part.
pub async fn create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ProjectView>> {
    let form = ProjectForm::<ProjectCreate>::read(&mut multipart).await?;
    let data = form.data.ok_or_else(|| form::missing(DATA_FIELD))?;
    let geojson = match form.area_of_interest {
        Some(GeoJsonUpload::File(bytes)) => bytes,
        Some(GeoJsonUpload::Inline(_)) => {
            return Err(AppError::Core(CoreError::Validation(vec![FieldError::new(
                "value_error",
                &["body", AREA_FIELD],
                "Expected an uploaded file",
            )])))
        }
        None => return Err(form::missing(AREA_FIELD)),
    };

    let project = state.projects.create(data, &geojson).await?;
    Ok(Json(project))
}

/// GET /v1/project?page=&page_size=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<ProjectListResponse>> {
    let page = PageRequest::try_from(params)?;
    let result = state.projects.list(page).await?;

    Ok(Json(ProjectListResponse {
        elements: result.results.len(),
        results: result.results,
        has_next_page: result.has_next_page,
        page_size: page.page_size(),
        page: page.page(),
    }))
}

/// GET /v1/project/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ProjectView>> {
    let project = state.projects.get(&id).await?;
    Ok(Json(project))
}

/// PATCH /v1/project/{id}
///
/// Same parts as create, all optional. `area_of_interest` may be a file part
/// or a plain string value.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<ProjectView>> {
    let form = ProjectForm::<ProjectUpdate>::read(&mut multipart).await?;
    let data = form.data.unwrap_or_default();
    let geojson = form.area_of_interest.map(GeoJsonUpload::into_bytes);

    let project = state
        .projects
        .update(&id, data, geojson.as_deref())
        .await?;
    Ok(Json(project))
}

/// DELETE /v1/project/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.projects.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
