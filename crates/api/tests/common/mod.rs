#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use aoi_api::config::{DatabaseConfig, ServerConfig};
use aoi_api::router::build_app_router;
use aoi_api::state::AppState;

const BOUNDARY: &str = "aoi-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
///
/// The database section is never used to connect; `#[sqlx::test]` hands
/// each test its own pool.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        is_debug: false,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 10 * 1024 * 1024,
        database: DatabaseConfig {
            host: "localhost".to_string(),
            user: "test".to_string(),
            password: "test".to_string(),
            db: "test".to_string(),
            port: 5432,
            max_connections: 5,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    build_app_router(AppState::new(pool, config.clone()), &config)
}

/// A valid MultiPolygon Feature.
pub fn area_geojson() -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "MultiPolygon",
            "coordinates": [[[
                [-52.8430645648562, -5.63351005831322],
                [-52.8289481608136, -5.674529420529012],
                [-52.8114438198008, -5.6661010219506664],
                [-52.8430645648562, -5.63351005831322]
            ]]]
        }
    })
}

/// A second valid Feature, distinct from [`area_geojson`].
pub fn other_geojson() -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "MultiPolygon",
            "coordinates": [[[
                [10.5, 20.5],
                [11.5, 20.5],
                [11.5, 21.5],
                [10.5, 20.5]
            ]]]
        }
    })
}

/// Project `data` part for a create request.
pub fn project_data(name: &str) -> Value {
    json!({
        "name": name,
        "date_range": {"start": "2025-10-12", "end": "2025-10-15"},
    })
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

/// One part of a multipart/form-data body.
pub enum Part<'a> {
    Text {
        name: &'a str,
        value: &'a [u8],
    },
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

impl<'a> Part<'a> {
    pub fn data(value: &'a str) -> Self {
        Part::Text {
            name: "data",
            value: value.as_bytes(),
        }
    }

    pub fn json_file(bytes: &'a [u8]) -> Self {
        Part::File {
            name: "area_of_interest",
            filename: "area.geojson",
            content_type: "application/json",
            bytes,
        }
    }

    pub fn inline_area(value: &'a [u8]) -> Self {
        Part::Text {
            name: "area_of_interest",
            value,
        }
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value);
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Send a multipart/form-data request.
pub async fn send_multipart(app: Router, method: Method, uri: &str, parts: &[Part<'_>]) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Create a project through the API and return its JSON view.
pub async fn create_project(pool: &PgPool, name: &str) -> Value {
    let data = project_data(name).to_string();
    let area = area_geojson().to_string();
    let response = send_multipart(
        build_test_app(pool.clone()),
        Method::POST,
        "/v1/project",
        &[Part::data(&data), Part::json_file(area.as_bytes())],
    )
    .await;
    assert_eq!(response.status(), 200, "create should succeed");
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Plain requests
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}
