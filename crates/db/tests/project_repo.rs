//! Integration tests for `ProjectRepo` against a real database.
//!
//! Covers the aggregate lifecycle (create, find, list, update, delete),
//! transaction boundaries owned by the caller, and the schema constraints
//! that back the 1:1 project/area relationship.

use chrono::NaiveDate;
use serde_json::json;
use sqlx::PgPool;

use aoi_db::models::project::NewProject;
use aoi_db::repositories::ProjectRepo;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn feature(offset: f64) -> serde_json::Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "MultiPolygon",
            "coordinates": [[[
                [offset, 0.5],
                [offset + 1.5, 0.5],
                [offset + 1.5, 2.5],
                [offset, 0.5]
            ]]]
        }
    })
}

fn new_project(name: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        description: String::new(),
        start_date: date("2025-10-12"),
        end_date: date("2025-10-15"),
        geojson_data: feature(10.5),
    }
}

async fn area_count(pool: &PgPool) -> i64 {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM areas_of_interest")
        .fetch_one(pool)
        .await
        .unwrap();
    count.0
}

// ---------------------------------------------------------------------------
// Create / find
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_then_find_returns_aggregate(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let created = ProjectRepo::create(&mut tx, &new_project("Survey"))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let found = ProjectRepo::find_by_id(&mut conn, &created.project.id)
        .await
        .unwrap()
        .expect("project should exist");

    assert_eq!(found.project.name, "Survey");
    assert_eq!(found.project.description.as_deref(), Some(""));
    assert_eq!(found.project.start_date, date("2025-10-12"));
    assert_eq!(found.project.end_date, date("2025-10-15"));
    let area = found.area_of_interest.expect("area should be joined");
    assert_eq!(area.project_id, created.project.id);
    assert_eq!(area.geojson_data, feature(10.5));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_generates_uuid_ids(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let created = ProjectRepo::create(&mut conn, &new_project("Ids"))
        .await
        .unwrap();

    assert_eq!(created.project.id.len(), 36);
    let area = created.area_of_interest.unwrap();
    assert_eq!(area.id.len(), 36);
    assert_ne!(area.id, created.project.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn uncommitted_create_is_rolled_back(pool: PgPool) {
    let id = {
        let mut tx = pool.begin().await.unwrap();
        let created = ProjectRepo::create(&mut tx, &new_project("Dropped"))
            .await
            .unwrap();
        created.project.id
        // tx dropped here without commit
    };

    let mut conn = pool.acquire().await.unwrap();
    assert!(ProjectRepo::find_by_id(&mut conn, &id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(area_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn find_missing_returns_none(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let found = ProjectRepo::find_by_id(&mut conn, "00000000-0000-0000-0000-000000000000")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn find_project_without_area_joins_none(pool: PgPool) {
    sqlx::query(
        "INSERT INTO projects (id, name, start_date, end_date)
         VALUES ('bare', 'Bare', '2025-01-01', '2025-01-02')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let found = ProjectRepo::find_by_id(&mut conn, "bare")
        .await
        .unwrap()
        .unwrap();
    assert!(found.area_of_interest.is_none());
    assert!(found.project.description.is_none());
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_returns_insertion_order_with_offset_and_limit(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    for name in ["first", "second", "third"] {
        ProjectRepo::create(&mut conn, &new_project(name))
            .await
            .unwrap();
    }

    let all = ProjectRepo::list(&mut conn, 0, 10).await.unwrap();
    let names: Vec<_> = all.iter().map(|p| p.project.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
    assert!(all.iter().all(|p| p.area_of_interest.is_some()));

    let window = ProjectRepo::list(&mut conn, 1, 1).await.unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].project.name, "second");

    let past_end = ProjectRepo::list(&mut conn, 5, 3).await.unwrap();
    assert!(past_end.is_empty());
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_writes_fields_and_bumps_modified(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let created = ProjectRepo::create(&mut conn, &new_project("Before"))
        .await
        .unwrap();

    let mut project = created.project.clone();
    project.name = "After".to_string();
    project.description = Some("changed".to_string());
    project.end_date = date("2025-12-31");

    let updated = ProjectRepo::update(&mut conn, &project).await.unwrap();
    assert_eq!(updated.name, "After");
    assert_eq!(updated.description.as_deref(), Some("changed"));
    assert_eq!(updated.end_date, date("2025-12-31"));
    assert_eq!(updated.created, created.project.created);
    assert!(updated.modified > created.project.modified);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn set_area_document_replaces_geometry(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let created = ProjectRepo::create(&mut conn, &new_project("Area"))
        .await
        .unwrap();
    let area = created.area_of_interest.unwrap();

    let replaced = ProjectRepo::set_area_document(&mut conn, &area.id, &feature(-20.5))
        .await
        .unwrap();
    assert_eq!(replaced.id, area.id);
    assert_eq!(replaced.geojson_data, feature(-20.5));

    let found = ProjectRepo::find_by_id(&mut conn, &created.project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.area_of_interest.unwrap().geojson_data, feature(-20.5));
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_cascades_to_area(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let created = ProjectRepo::create(&mut conn, &new_project("Doomed"))
        .await
        .unwrap();
    assert_eq!(area_count(&pool).await, 1);

    let deleted = ProjectRepo::delete(&mut conn, &created.project.id)
        .await
        .unwrap();
    assert!(deleted);
    assert_eq!(area_count(&pool).await, 0);
    assert!(ProjectRepo::find_by_id(&mut conn, &created.project.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_missing_returns_false(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let deleted = ProjectRepo::delete(&mut conn, "missing").await.unwrap();
    assert!(!deleted);
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_area_for_project_violates_unique_constraint(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let created = ProjectRepo::create(&mut conn, &new_project("One area"))
        .await
        .unwrap();

    let err = ProjectRepo::attach_area(&mut conn, &created.project.id, &feature(1.5))
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("uq_areas_of_interest_project_id"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn overlong_name_is_a_storage_error(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let result = ProjectRepo::create(&mut conn, &new_project(&"n".repeat(33))).await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reversed_date_range_violates_check_constraint(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let mut input = new_project("Reversed");
    input.start_date = date("2025-02-01");
    input.end_date = date("2025-01-01");

    let err = ProjectRepo::create(&mut conn, &input).await.unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("ck_projects_date_range"));
}
