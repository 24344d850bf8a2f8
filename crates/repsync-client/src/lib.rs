//! Repsync Client - HTTP client for the Wger exercise database API
//!
//! This crate provides the [`wger`] client, which implements the
//! `ExternalCatalog` port from `repsync-core` on top of the public Wger
//! REST API: paginated equipment and exercise listings with retry on
//! transient failures.

pub mod wger;

// Re-export main client type
pub use wger::WgerClient;
