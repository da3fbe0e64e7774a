//! GeoJSON area-of-interest validation.
//!
//! Exactly one shape is accepted: a `Feature` whose geometry is a
//! `MultiPolygon`. Parsing runs in three stages:
//!
//! 1. JSON decoding of the raw upload.
//! 2. Structural validation of the Feature shape. Every violation is
//!    collected with its field path; messages never echo the input.
//! 3. Ring well-formedness (closure and minimum length). Only runs once the
//!    structure is known to be sound.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Map, Value};

/// Message attached to [`ParseErrorKind::MalformedJson`] failures.
pub const MALFORMED_JSON_MESSAGE: &str =
    "The uploaded GeoJSON file could not be loaded correctly. Please check the file.";

/// Message attached to [`ParseErrorKind::SchemaInvalid`] failures.
pub const INVALID_GEOJSON_MESSAGE: &str = "The GeoJSON file contains errors";

/// A closed linear ring needs at least four positions (three distinct
/// corners plus the closing position).
pub const MIN_RING_POSITIONS: usize = 4;

const FIELD_REQUIRED: &str = "Field required";
const EXPECTED_OBJECT: &str = "Input should be a valid dictionary or object to extract fields from";
const EXPECTED_LIST: &str = "Input should be a valid list";
const EXPECTED_NUMBER: &str = "Input should be a finite number";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Which stage rejected the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// The bytes are not JSON at all.
    MalformedJson,
    /// The JSON is not a well-formed MultiPolygon Feature.
    SchemaInvalid,
}

/// A rejected GeoJSON upload: a summary message plus one entry per problem.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct GeoJsonParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub errors: Vec<String>,
}

impl GeoJsonParseError {
    fn malformed(err: serde_json::Error) -> Self {
        Self {
            kind: ParseErrorKind::MalformedJson,
            message: MALFORMED_JSON_MESSAGE.to_string(),
            errors: vec![err.to_string()],
        }
    }

    fn schema_invalid(errors: Vec<String>) -> Self {
        Self {
            kind: ParseErrorKind::SchemaInvalid,
            message: INVALID_GEOJSON_MESSAGE.to_string(),
            errors,
        }
    }
}

// ---------------------------------------------------------------------------
// Validated types
// ---------------------------------------------------------------------------

/// `(longitude, latitude)`.
pub type Position = [f64; 2];

pub type LinearRing = Vec<Position>;

/// Outer ring followed by any holes.
pub type Polygon = Vec<LinearRing>;

/// A validated `MultiPolygon` geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub coordinates: Vec<Polygon>,
}

/// A validated `Feature` wrapping a single [`Geometry`].
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
}

impl Feature {
    /// Serialise back to the plain JSON document that gets persisted.
    ///
    /// Only `type` and `geometry` are emitted; other members of the upload
    /// (`properties`, `id`, ...) are not carried over.
    pub fn to_document(&self) -> Value {
        json!({
            "type": "Feature",
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": self.geometry.coordinates,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Decode and validate an uploaded GeoJSON document.
pub fn parse(raw: &[u8]) -> Result<Feature, GeoJsonParseError> {
    let value: Value = serde_json::from_slice(raw).map_err(GeoJsonParseError::malformed)?;

    let mut check = SchemaCheck::default();
    let feature = check.feature(&value);
    let feature = match feature {
        Some(feature) if check.errors.is_empty() => feature,
        _ => return Err(GeoJsonParseError::schema_invalid(check.errors)),
    };

    let ring_errors = ring_errors(&feature.geometry);
    if !ring_errors.is_empty() {
        return Err(GeoJsonParseError::schema_invalid(ring_errors));
    }

    Ok(feature)
}

// ---------------------------------------------------------------------------
// Structural check
// ---------------------------------------------------------------------------

/// Dotted location inside the document, e.g. `geometry.coordinates.0.1`.
#[derive(Debug, Clone, Default)]
struct FieldPath(Vec<String>);

impl FieldPath {
    fn child(&self, segment: impl fmt::Display) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("(root)")
        } else {
            f.write_str(&self.0.join("."))
        }
    }
}

/// Walks the decoded value, building the typed [`Feature`] and recording
/// every violation instead of stopping at the first one.
#[derive(Default)]
struct SchemaCheck {
    errors: Vec<String>,
}

impl SchemaCheck {
    fn report(&mut self, path: &FieldPath, message: impl fmt::Display) {
        self.errors.push(format!("{path}: {message}"));
    }

    fn feature(&mut self, value: &Value) -> Option<Feature> {
        let root = FieldPath::default();
        let obj = self.object(value, &root)?;

        let type_ok = self.literal(obj, "type", "Feature", &root);
        let geometry = self
            .required(obj, "geometry", &root)
            .and_then(|v| self.geometry(v, &root.child("geometry")));

        match (type_ok, geometry) {
            (true, Some(geometry)) => Some(Feature { geometry }),
            _ => None,
        }
    }

    fn geometry(&mut self, value: &Value, path: &FieldPath) -> Option<Geometry> {
        let obj = self.object(value, path)?;

        let type_ok = self.literal(obj, "type", "MultiPolygon", path);
        let coordinates = self
            .required(obj, "coordinates", path)
            .and_then(|v| {
                let path = path.child("coordinates");
                self.list(v, &path, |check, item, item_path| check.polygon(item, item_path))
            });

        match (type_ok, coordinates) {
            (true, Some(coordinates)) => Some(Geometry { coordinates }),
            _ => None,
        }
    }

    fn polygon(&mut self, value: &Value, path: &FieldPath) -> Option<Polygon> {
        self.list(value, path, |check, ring, ring_path| {
            check.list(ring, ring_path, |check, pos, pos_path| {
                check.position(pos, pos_path)
            })
        })
    }

    fn position(&mut self, value: &Value, path: &FieldPath) -> Option<Position> {
        let Some(items) = value.as_array() else {
            self.report(path, EXPECTED_LIST);
            return None;
        };
        if items.len() != 2 {
            self.report(
                path,
                format!("Position should have exactly 2 items, not {}", items.len()),
            );
            return None;
        }

        let lon = self.number(&items[0], &path.child(0));
        let lat = self.number(&items[1], &path.child(1));
        Some([lon?, lat?])
    }

    fn number(&mut self, value: &Value, path: &FieldPath) -> Option<f64> {
        match value.as_f64() {
            Some(n) if n.is_finite() => Some(n),
            _ => {
                self.report(path, EXPECTED_NUMBER);
                None
            }
        }
    }

    /// Validate every element of a JSON array with `item`, visiting all of
    /// them so that each bad element is reported.
    fn list<T>(
        &mut self,
        value: &Value,
        path: &FieldPath,
        mut item: impl FnMut(&mut Self, &Value, &FieldPath) -> Option<T>,
    ) -> Option<Vec<T>> {
        let Some(items) = value.as_array() else {
            self.report(path, EXPECTED_LIST);
            return None;
        };

        let parsed: Vec<Option<T>> = items
            .iter()
            .enumerate()
            .map(|(i, v)| item(self, v, &path.child(i)))
            .collect();
        parsed.into_iter().collect()
    }

    fn object<'a>(&mut self, value: &'a Value, path: &FieldPath) -> Option<&'a Map<String, Value>> {
        let obj = value.as_object();
        if obj.is_none() {
            self.report(path, EXPECTED_OBJECT);
        }
        obj
    }

    fn required<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        key: &str,
        path: &FieldPath,
    ) -> Option<&'a Value> {
        let value = obj.get(key);
        if value.is_none() {
            self.report(&path.child(key), FIELD_REQUIRED);
        }
        value
    }

    fn literal(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        expected: &str,
        path: &FieldPath,
    ) -> bool {
        match self.required(obj, key, path) {
            Some(Value::String(s)) if s == expected => true,
            Some(_) => {
                self.report(&path.child(key), format!("Input should be '{expected}'"));
                false
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Semantic check
// ---------------------------------------------------------------------------

fn ring_errors(geometry: &Geometry) -> Vec<String> {
    let mut errors = Vec::new();

    for (p, polygon) in geometry.coordinates.iter().enumerate() {
        for (r, ring) in polygon.iter().enumerate() {
            if ring.len() < MIN_RING_POSITIONS {
                errors.push(format!(
                    "polygon {p}, ring {r}: LinearRing must contain with {MIN_RING_POSITIONS} or more positions"
                ));
            }
            if ring.first() != ring.last() {
                errors.push(format!(
                    "polygon {p}, ring {r}: The first and last positions in LinearRing must be equivalent"
                ));
            }
        }
    }

    errors
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
