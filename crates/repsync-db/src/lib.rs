//! Repsync DB - PostgreSQL persistence for the catalog
//!
//! [`CatalogRepository`] implements the `CatalogStore` port from
//! `repsync-core` on top of `sqlx`. The expected schema lives in
//! `schema.sql` at the crate root.

pub mod repository;

pub use repository::CatalogRepository;
