//! Repository layer.
//!
//! Repositories are zero-sized structs whose async methods take a
//! `&mut PgConnection`. Callers pass a transaction (or a pooled connection
//! for reads) and own the commit boundary.

pub mod project_repo;

pub use project_repo::ProjectRepo;
