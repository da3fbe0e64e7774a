use serde::Serialize;

use crate::geojson::GeoJsonParseError;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {}", join_messages(.0))]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    GeoJson(#[from] GeoJsonParseError),
}

/// A single rejected input field, shaped like the `detail` entries the
/// HTTP layer returns with a 422.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: String,
    pub loc: Vec<String>,
    pub msg: String,
}

impl FieldError {
    pub fn new(kind: impl Into<String>, loc: &[&str], msg: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.into(),
        }
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.loc.join("."), e.msg))
        .collect::<Vec<_>>()
        .join("; ")
}
