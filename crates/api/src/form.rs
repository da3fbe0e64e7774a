//! Multipart form decoding for the project endpoints.
//!
//! Both create and update take two parts: `data`, a JSON document with the
//! project fields, and `area_of_interest`, the GeoJSON upload.

use aoi_core::error::{CoreError, FieldError};
use axum::extract::multipart::Field;
use axum::extract::Multipart;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

pub const DATA_FIELD: &str = "data";
pub const AREA_FIELD: &str = "area_of_interest";

const JSON_CONTENT_TYPE: &str = "application/json";

/// How the `area_of_interest` part arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoJsonUpload {
    /// A file part (it carried a filename) with a JSON content type.
    File(Vec<u8>),
    /// A plain form value. Invalid UTF-8 sequences are dropped on decoding.
    Inline(String),
}

impl GeoJsonUpload {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            GeoJsonUpload::File(bytes) => bytes,
            GeoJsonUpload::Inline(text) => text.into_bytes(),
        }
    }
}

/// Decoded project form. Either part may be absent; handlers decide which
/// are required.
#[derive(Debug)]
pub struct ProjectForm<T> {
    pub data: Option<T>,
    pub area_of_interest: Option<GeoJsonUpload>,
}

impl<T: DeserializeOwned> ProjectForm<T> {
    /// Drain the multipart stream. Unknown parts are ignored.
    pub async fn read(multipart: &mut Multipart) -> AppResult<Self> {
        let mut data = None;
        let mut area_of_interest = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                DATA_FIELD => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    data = Some(parse_data(&text)?);
                }
                AREA_FIELD => {
                    area_of_interest = read_upload(field).await?;
                }
                _ => {} // ignore unknown fields
            }
        }

        Ok(Self {
            data,
            area_of_interest,
        })
    }
}

/// 422 for a required part that never arrived.
pub fn missing(field: &str) -> AppError {
    AppError::Core(CoreError::Validation(vec![FieldError::new(
        "missing",
        &["body", field],
        "Field required",
    )]))
}

fn parse_data<T: DeserializeOwned>(text: &str) -> AppResult<T> {
    serde_json::from_str(text).map_err(|e| {
        AppError::Core(CoreError::Validation(vec![FieldError::new(
            "json_invalid",
            &["body", DATA_FIELD],
            e.to_string(),
        )]))
    })
}

/// Dispatch on the part's shape: a filename means a file upload, otherwise
/// the value is taken as inline text. An empty inline value counts as absent.
async fn read_upload(field: Field<'_>) -> AppResult<Option<GeoJsonUpload>> {
    if field.file_name().is_none() {
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let text = utf8_ignoring_invalid(&bytes);
        return Ok((!text.is_empty()).then_some(GeoJsonUpload::Inline(text)));
    }

    if field.content_type() != Some(JSON_CONTENT_TYPE) {
        return Err(AppError::BadRequest(
            "Invalid file type. Only JSON files are allowed.".into(),
        ));
    }

    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Some(GeoJsonUpload::File(bytes.to_vec())))
}

/// Decode UTF-8, silently dropping invalid byte sequences.
fn utf8_ignoring_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}
