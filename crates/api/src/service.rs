//! Project service: the transaction-scoped use cases behind `/v1/project`.
//!
//! Each operation opens its own transaction (or pooled connection for reads)
//! and runs fetch, mutate, commit strictly in sequence. Dropping a
//! transaction before commit rolls it back, so an aborted request leaves no
//! partial state.

use aoi_core::error::CoreError;
use aoi_core::geojson;
use aoi_core::pagination::PageRequest;
use aoi_core::project::{DateRange, ProjectCreate, ProjectPatch, ProjectUpdate};
use aoi_core::types::DbId;
use aoi_db::models::project::{NewProject, Project, ProjectWithArea};
use aoi_db::repositories::ProjectRepo;
use aoi_db::DbPool;
use serde::Serialize;
use serde_json::json;

use crate::error::AppResult;

/// Location prefix for input validation errors.
const DATA_LOC: &[&str] = &["data"];

/// Externally visible projection of a project aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectView {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub date_range: DateRange,
    /// The stored Feature document, or `{}` when the project has no area.
    pub area_of_interest: serde_json::Value,
}

impl From<ProjectWithArea> for ProjectView {
    fn from(aggregate: ProjectWithArea) -> Self {
        let ProjectWithArea {
            project,
            area_of_interest,
        } = aggregate;

        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            date_range: DateRange {
                start: project.start_date,
                end: project.end_date,
            },
            area_of_interest: area_of_interest
                .map(|area| area.geojson_data)
                .unwrap_or_else(|| json!({})),
        }
    }
}

/// One page of projects.
#[derive(Debug, Clone)]
pub struct ProjectPage {
    pub results: Vec<ProjectView>,
    pub has_next_page: bool,
}

/// Orchestrates validation and persistence for the project aggregate.
#[derive(Clone)]
pub struct ProjectService {
    pool: DbPool,
}

impl ProjectService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Validate the input and geometry, then insert the project together
    /// with its area of interest.
    pub async fn create(&self, input: ProjectCreate, geojson_bytes: &[u8]) -> AppResult<ProjectView> {
        let input = input.validated(DATA_LOC)?;
        let feature = geojson::parse(geojson_bytes)?;

        let new_project = NewProject {
            name: input.name,
            description: input.description,
            start_date: input.date_range.start,
            end_date: input.date_range.end,
            geojson_data: feature.to_document(),
        };

        let mut tx = self.pool.begin().await?;
        let project = ProjectRepo::create(&mut tx, &new_project).await?;
        tx.commit().await?;

        tracing::info!(project_id = %project.project.id, "Project created");
        Ok(project.into())
    }

    pub async fn get(&self, id: &str) -> AppResult<ProjectView> {
        let mut conn = self.pool.acquire().await?;
        let project = ProjectRepo::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        Ok(project.into())
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        ProjectRepo::find_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        ProjectRepo::delete(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(project_id = %id, "Project deleted");
        Ok(())
    }

    /// Fetch one page using the over-fetch-by-one rule; see
    /// [`PageRequest::split`].
    pub async fn list(&self, page: PageRequest) -> AppResult<ProjectPage> {
        let mut conn = self.pool.acquire().await?;
        let rows = ProjectRepo::list(&mut conn, page.offset(), page.fetch_limit()).await?;
        let (rows, has_next_page) = page.split(rows);

        Ok(ProjectPage {
            results: rows.into_iter().map(ProjectView::from).collect(),
            has_next_page,
        })
    }

    /// Apply a partial update.
    ///
    /// Fields absent from `input` are left untouched. When `geojson_bytes`
    /// is given the area document is replaced, or created if the project
    /// has none. A date range always arrives whole, so its ordering is
    /// settled by [`ProjectUpdate::validated`].
    pub async fn update(
        &self,
        id: &str,
        input: ProjectUpdate,
        geojson_bytes: Option<&[u8]>,
    ) -> AppResult<ProjectView> {
        let patch = ProjectPatch::from(input.validated(DATA_LOC)?);

        let mut tx = self.pool.begin().await?;
        let aggregate = ProjectRepo::find_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;

        let mut project = aggregate.project;
        apply_patch(&mut project, patch);

        let document = geojson_bytes
            .map(geojson::parse)
            .transpose()?
            .map(|feature| feature.to_document());

        ProjectRepo::update(&mut tx, &project).await?;
        if let Some(document) = document {
            match &aggregate.area_of_interest {
                Some(area) => {
                    ProjectRepo::set_area_document(&mut tx, &area.id, &document).await?;
                }
                None => {
                    tracing::warn!(project_id = %id, "Project had no area of interest, attaching one");
                    ProjectRepo::attach_area(&mut tx, id, &document).await?;
                }
            }
        }
        tx.commit().await?;

        // Re-read so the view reflects server-assigned values.
        let mut conn = self.pool.acquire().await?;
        let refreshed = ProjectRepo::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        Ok(refreshed.into())
    }
}

fn apply_patch(project: &mut Project, patch: ProjectPatch) {
    if let Some(name) = patch.name {
        project.name = name;
    }
    if let Some(description) = patch.description {
        project.description = Some(description);
    }
    if let Some(start_date) = patch.start_date {
        project.start_date = start_date;
    }
    if let Some(end_date) = patch.end_date {
        project.end_date = end_date;
    }
}

fn not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Project",
        id: id.to_string(),
    }
}
