pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/v1` route tree.
///
/// ```text
/// /project              list (GET), create (POST)
/// /project/{id}         get (GET), update (PATCH), delete (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/project", project::router())
}
