//! Project aggregate: the `projects` row plus its owned `areas_of_interest` row.

use aoi_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created: Timestamp,
    pub modified: Timestamp,
}

/// A row from the `areas_of_interest` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AreaOfInterest {
    pub id: DbId,
    pub project_id: DbId,
    pub geojson_data: serde_json::Value,
    pub created: Timestamp,
    pub modified: Timestamp,
}

/// A project loaded together with its area of interest.
///
/// `area_of_interest` is only `None` for rows written outside the
/// application; [`ProjectRepo::create`](crate::repositories::ProjectRepo::create)
/// always inserts both.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithArea {
    #[serde(flatten)]
    pub project: Project,
    pub area_of_interest: Option<AreaOfInterest>,
}

/// DTO for inserting a project and its area in one go.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Validated Feature document.
    pub geojson_data: serde_json::Value,
}
