//! Repository for the `projects` / `areas_of_interest` aggregate.

use aoi_core::types::{new_id, DbId, Timestamp};
use chrono::NaiveDate;
use sqlx::{FromRow, PgConnection};

use crate::models::project::{AreaOfInterest, NewProject, Project, ProjectWithArea};

/// Column list shared across `projects` queries.
const PROJECT_COLUMNS: &str = "id, name, description, start_date, end_date, created, modified";

/// Column list shared across `areas_of_interest` queries.
const AREA_COLUMNS: &str = "id, project_id, geojson_data, created, modified";

/// Project columns plus the joined area, prefixed to avoid name clashes.
const JOINED_SELECT: &str = "SELECT p.id, p.name, p.description, p.start_date, p.end_date, \
        p.created, p.modified, \
        a.id AS area_id, a.geojson_data AS area_geojson_data, \
        a.created AS area_created, a.modified AS area_modified \
     FROM projects p \
     LEFT JOIN areas_of_interest a ON a.project_id = p.id";

/// Provides aggregate persistence for projects. No business rules are
/// enforced here; constraint violations surface as `sqlx::Error`.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project and its area of interest. Does not commit.
    pub async fn create(
        conn: &mut PgConnection,
        input: &NewProject,
    ) -> Result<ProjectWithArea, sqlx::Error> {
        let insert_project = format!(
            "INSERT INTO projects (id, name, description, start_date, end_date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PROJECT_COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&insert_project)
            .bind(new_id())
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.start_date)
            .bind(input.end_date)
            .fetch_one(&mut *conn)
            .await?;

        let area = Self::attach_area(conn, &project.id, &input.geojson_data).await?;
        tracing::debug!(project_id = %project.id, area_id = %area.id, "Staged new project");

        Ok(ProjectWithArea {
            project,
            area_of_interest: Some(area),
        })
    }

    /// Find a project by ID together with its area of interest.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: &str,
    ) -> Result<Option<ProjectWithArea>, sqlx::Error> {
        let query = format!("{JOINED_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, JoinedRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(ProjectWithArea::from))
    }

    /// List projects in insertion order, applying `offset` and `limit` as given.
    pub async fn list(
        conn: &mut PgConnection,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ProjectWithArea>, sqlx::Error> {
        let query = format!("{JOINED_SELECT} ORDER BY p.created, p.id OFFSET $1 LIMIT $2");
        let rows = sqlx::query_as::<_, JoinedRow>(&query)
            .bind(offset)
            .bind(limit)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(ProjectWithArea::from).collect())
    }

    /// Write a project's scalar fields back and bump `modified`.
    pub async fn update(
        conn: &mut PgConnection,
        project: &Project,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = $2,
                description = $3,
                start_date = $4,
                end_date = $5,
                modified = clock_timestamp()
             WHERE id = $1
             RETURNING {PROJECT_COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&project.id)
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.start_date)
            .bind(project.end_date)
            .fetch_one(&mut *conn)
            .await
    }

    /// Replace the GeoJSON document of an existing area.
    pub async fn set_area_document(
        conn: &mut PgConnection,
        area_id: &str,
        geojson_data: &serde_json::Value,
    ) -> Result<AreaOfInterest, sqlx::Error> {
        let query = format!(
            "UPDATE areas_of_interest SET geojson_data = $2, modified = clock_timestamp()
             WHERE id = $1
             RETURNING {AREA_COLUMNS}"
        );
        sqlx::query_as::<_, AreaOfInterest>(&query)
            .bind(area_id)
            .bind(geojson_data)
            .fetch_one(&mut *conn)
            .await
    }

    /// Insert an area of interest for a project. Fails on the unique
    /// constraint if the project already has one.
    pub async fn attach_area(
        conn: &mut PgConnection,
        project_id: &str,
        geojson_data: &serde_json::Value,
    ) -> Result<AreaOfInterest, sqlx::Error> {
        let query = format!(
            "INSERT INTO areas_of_interest (id, project_id, geojson_data)
             VALUES ($1, $2, $3)
             RETURNING {AREA_COLUMNS}"
        );
        sqlx::query_as::<_, AreaOfInterest>(&query)
            .bind(new_id())
            .bind(project_id)
            .bind(geojson_data)
            .fetch_one(&mut *conn)
            .await
    }

    /// Delete a project. Its area is removed by the `ON DELETE CASCADE`
    /// foreign key. Returns `true` if a row was removed.
    pub async fn delete(conn: &mut PgConnection, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// One row of [`JOINED_SELECT`]; area columns are NULL when no area exists.
#[derive(FromRow)]
struct JoinedRow {
    id: DbId,
    name: String,
    description: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    created: Timestamp,
    modified: Timestamp,
    area_id: Option<DbId>,
    area_geojson_data: Option<serde_json::Value>,
    area_created: Option<Timestamp>,
    area_modified: Option<Timestamp>,
}

impl From<JoinedRow> for ProjectWithArea {
    fn from(row: JoinedRow) -> Self {
        let area_of_interest = match (
            row.area_id,
            row.area_geojson_data,
            row.area_created,
            row.area_modified,
        ) {
            (Some(id), Some(geojson_data), Some(created), Some(modified)) => Some(AreaOfInterest {
                id,
                project_id: row.id.clone(),
                geojson_data,
                created,
                modified,
            }),
            _ => None,
        };

        ProjectWithArea {
            project: Project {
                id: row.id,
                name: row.name,
                description: row.description,
                start_date: row.start_date,
                end_date: row.end_date,
                created: row.created,
                modified: row.modified,
            },
            area_of_interest,
        }
    }
}
