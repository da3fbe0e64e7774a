//! Domain logic for the area-of-interest project service.
//!
//! Nothing in this crate performs I/O: GeoJSON validation, project input
//! rules and pagination math are all pure functions over owned values.

pub mod error;
pub mod geojson;
pub mod pagination;
pub mod project;
pub mod types;
