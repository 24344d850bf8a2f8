//! Repsync CLI - Command-line interface for the catalog sync tool
//!
//! This crate provides the CLI application that ties together all Repsync components.

pub mod config;

pub use config::{CatalogKind, Command, Config};
