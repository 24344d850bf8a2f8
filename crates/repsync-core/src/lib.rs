//! Core reconciliation engine for the Repsync catalog sync tool.
//!
//! This crate owns the domain model (equipment, exercises, muscle groups),
//! the CSV parsing and normalization of external records, the identity
//! index used for case-insensitive natural-key matching, and the CDC
//! reconciler that turns a batch of external records into minimal
//! create/update/skip decisions against a [`traits::CatalogStore`].

pub mod config;
pub mod csv_parser;
pub mod error;
pub mod import;
pub mod index;
pub mod models;
pub mod normalize;
pub mod sync;
pub mod traits;

pub use config::{
    load_sources_config, DbConfig, HttpConfig, SourcesConfig, SyncConfig, DEFAULT_WGER_BASE_URL,
};
pub use error::AppError;
pub use import::{CatalogSyncService, SyncMode};
pub use index::IdentityIndex;
pub use models::{
    CatalogStats, Equipment, EquipmentPatch, Exercise, ExercisePatch, MuscleGroup, Named,
    NewEquipment, NewExercise, RawEquipmentRecord, RawExerciseRecord,
};
pub use sync::{RowOutcome, RunReport};
pub use traits::{CatalogStore, ExternalCatalog, SourcePage};
