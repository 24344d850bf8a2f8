//! Domain model types for the catalog: equipment, exercises, muscle groups,
//! and the raw/candidate shapes that flow through an import run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::prelude::FromRow;

/// Entities matched by a case-insensitive natural-key name.
pub trait Named {
    fn natural_key(&self) -> &str;
}

/// A persisted equipment item.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Equipment {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Named for Equipment {
    fn natural_key(&self) -> &str {
        &self.name
    }
}

/// Create DTO for equipment. Also serves as the canonical candidate shape
/// the reconciler diffs against an existing row.
#[derive(Debug, Clone, Serialize)]
pub struct NewEquipment {
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
}

/// Changed-field subset for an equipment update.
///
/// `description` is doubly optional: the outer `Option` means "field changed",
/// the inner one carries the new value, which may be a cleared description.
#[derive(Debug, Clone, Default)]
pub struct EquipmentPatch {
    pub description: Option<Option<String>>,
    pub enabled: Option<bool>,
}

impl EquipmentPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.enabled.is_none()
    }

    /// Applies the patch to an in-memory copy of the entity, used to keep
    /// the identity index current after an update.
    pub fn apply_to(&self, equipment: &mut Equipment) {
        if let Some(description) = &self.description {
            equipment.description = description.clone();
        }
        if let Some(enabled) = self.enabled {
            equipment.enabled = enabled;
        }
    }
}

/// A persisted muscle group. An open taxonomy: imports create missing
/// muscle groups on demand.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MuscleGroup {
    pub id: i32,
    pub name: String,
}

impl Named for MuscleGroup {
    fn natural_key(&self) -> &str {
        &self.name
    }
}

/// A persisted exercise with its resolved reference-id lists.
///
/// `secondary_muscle_group_ids` and `equipment_ids` are compared as sets:
/// storage order is not significant.
#[derive(Debug, Clone, Serialize)]
pub struct Exercise {
    pub id: i32,
    pub name: String,
    pub enabled: bool,
    pub primary_muscle_group_id: Option<i32>,
    pub secondary_muscle_group_ids: Vec<i32>,
    pub equipment_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Named for Exercise {
    fn natural_key(&self) -> &str {
        &self.name
    }
}

/// Create DTO for an exercise, with all references already resolved to
/// internal ids. Doubles as the canonical candidate shape for the reconciler.
#[derive(Debug, Clone, Serialize)]
pub struct NewExercise {
    pub name: String,
    pub enabled: bool,
    pub primary_muscle_group_id: Option<i32>,
    pub secondary_muscle_group_ids: Vec<i32>,
    pub equipment_ids: Vec<i32>,
}

/// Changed-field subset for an exercise update.
#[derive(Debug, Clone, Default)]
pub struct ExercisePatch {
    pub enabled: Option<bool>,
    pub primary_muscle_group_id: Option<Option<i32>>,
    pub secondary_muscle_group_ids: Option<Vec<i32>>,
    pub equipment_ids: Option<Vec<i32>>,
}

impl ExercisePatch {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.primary_muscle_group_id.is_none()
            && self.secondary_muscle_group_ids.is_none()
            && self.equipment_ids.is_none()
    }

    pub fn apply_to(&self, exercise: &mut Exercise) {
        if let Some(enabled) = self.enabled {
            exercise.enabled = enabled;
        }
        if let Some(primary) = self.primary_muscle_group_id {
            exercise.primary_muscle_group_id = primary;
        }
        if let Some(secondary) = &self.secondary_muscle_group_ids {
            exercise.secondary_muscle_group_ids = secondary.clone();
        }
        if let Some(equipment) = &self.equipment_ids {
            exercise.equipment_ids = equipment.clone();
        }
    }
}

/// One equipment row as supplied by an external source, before
/// normalization. `line` is the 1-based CSV line number (header = line 1);
/// API-sourced records have no line and are identified by name in errors.
#[derive(Debug, Clone, Default)]
pub struct RawEquipmentRecord {
    pub line: Option<usize>,
    pub name: String,
    pub description: Option<String>,
    pub enabled: Option<String>,
}

/// One exercise row as supplied by an external source, with references
/// still expressed as names.
#[derive(Debug, Clone, Default)]
pub struct RawExerciseRecord {
    pub line: Option<usize>,
    pub name: String,
    pub enabled: Option<String>,
    pub primary_muscle_group: Option<String>,
    pub secondary_muscle_groups: Vec<String>,
    pub equipment: Vec<String>,
}

/// Aggregated catalog statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub equipment: i64,
    pub exercises: i64,
    pub muscle_groups: i64,
}
