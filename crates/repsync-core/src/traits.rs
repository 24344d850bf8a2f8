//! Port traits decoupling the reconciliation engine from its collaborators.
//!
//! [`CatalogStore`] is the persistence port implemented by the PostgreSQL
//! repository (and by in-memory mocks in tests). [`ExternalCatalog`] is the
//! paginated external-source port implemented by the Wger HTTP client.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    CatalogStats, Equipment, EquipmentPatch, Exercise, ExercisePatch, MuscleGroup, NewEquipment,
    NewExercise, RawEquipmentRecord, RawExerciseRecord,
};

/// Persistence port for the catalog entities.
///
/// Implementations must surface a unique-constraint violation on an entity
/// name as [`AppError::DuplicateName`]; every other failure maps to its
/// regular variant. Multi-statement operations (exercise create/update with
/// reference links) must be atomic per call, so a failed row never leaves
/// partial writes behind.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // Equipment ------------------------------------------------------------

    async fn list_equipment(&self, limit: i64) -> Result<Vec<Equipment>, AppError>;
    async fn get_equipment_by_name(&self, name: &str) -> Result<Option<Equipment>, AppError>;
    async fn create_equipment(&self, new: &NewEquipment) -> Result<Equipment, AppError>;
    async fn update_equipment(&self, id: i32, patch: &EquipmentPatch) -> Result<(), AppError>;
    async fn delete_equipment(&self, id: i32) -> Result<(), AppError>;

    // Exercises ------------------------------------------------------------

    async fn list_exercises(&self, limit: i64) -> Result<Vec<Exercise>, AppError>;
    async fn get_exercise_by_name(&self, name: &str) -> Result<Option<Exercise>, AppError>;
    async fn create_exercise(&self, new: &NewExercise) -> Result<Exercise, AppError>;
    async fn update_exercise(&self, id: i32, patch: &ExercisePatch) -> Result<(), AppError>;
    async fn delete_exercise(&self, id: i32) -> Result<(), AppError>;

    // Muscle groups --------------------------------------------------------

    async fn list_muscle_groups(&self) -> Result<Vec<MuscleGroup>, AppError>;
    async fn get_muscle_group_by_name(&self, name: &str) -> Result<Option<MuscleGroup>, AppError>;
    async fn create_muscle_group(&self, name: &str) -> Result<MuscleGroup, AppError>;

    // Exercise-equipment links ---------------------------------------------

    async fn equipment_ids_for_exercise(&self, exercise_id: i32) -> Result<Vec<i32>, AppError>;
    async fn link_equipment(&self, exercise_id: i32, equipment_id: i32) -> Result<(), AppError>;
    async fn unlink_equipment(&self, exercise_id: i32, equipment_id: i32) -> Result<(), AppError>;

    // Stats ----------------------------------------------------------------

    async fn get_stats(&self) -> Result<CatalogStats, AppError>;
}

/// One page of records from a paginated external source.
#[derive(Debug, Clone)]
pub struct SourcePage<T> {
    pub items: Vec<T>,
    /// Opaque cursor for the next page; `None` when exhausted.
    pub next: Option<String>,
}

/// Paginated external-source port.
///
/// Cursors are opaque to the engine; the Wger implementation uses the
/// absolute `next` URL returned by the API.
#[async_trait]
pub trait ExternalCatalog: Send + Sync {
    async fn equipment_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<SourcePage<RawEquipmentRecord>, AppError>;

    async fn exercise_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<SourcePage<RawExerciseRecord>, AppError>;
}
