//! Import/sync reconciliation engine.
//!
//! [`CatalogSyncService`] drives a change-data-capture run: an identity
//! index is built once from the store, each external record is normalized
//! into a candidate, and the reconciler decides CREATE / UPDATE / SKIP per
//! row, isolating per-row failures so one bad record never aborts a batch.
//! Generic over the [`CatalogStore`] and [`ExternalCatalog`] ports so the
//! engine is testable against in-memory implementations.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::AppError;
use crate::index::IdentityIndex;
use crate::models::{
    Equipment, EquipmentPatch, Exercise, ExercisePatch, MuscleGroup, NewEquipment, NewExercise,
    RawEquipmentRecord, RawExerciseRecord,
};
use crate::normalize::{self, BlankNamePolicy};
use crate::sync::{RowOutcome, RunReport};
use crate::traits::{CatalogStore, ExternalCatalog};

/// How an import run treats the existing collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Change-data-capture: only new or changed rows are written.
    Incremental,
    /// Delete every entity of the target kind first, then reimport.
    /// Referenced entities of other kinds (muscle groups) survive.
    FullResync,
}

/// Computes the changed-field subset between an existing equipment row and
/// a candidate. Empty patch means the row is unchanged.
pub fn diff_equipment(existing: &Equipment, candidate: &NewEquipment) -> EquipmentPatch {
    let mut patch = EquipmentPatch::default();
    if existing.description != candidate.description {
        patch.description = Some(candidate.description.clone());
    }
    if existing.enabled != candidate.enabled {
        patch.enabled = Some(candidate.enabled);
    }
    patch
}

/// Order-insensitive comparison for reference-id lists.
fn set_eq(a: &[i32], b: &[i32]) -> bool {
    let a: HashSet<i32> = a.iter().copied().collect();
    let b: HashSet<i32> = b.iter().copied().collect();
    a == b
}

/// Computes the changed-field subset between an existing exercise and a
/// candidate. Reference-id lists compare as sets.
pub fn diff_exercise(existing: &Exercise, candidate: &NewExercise) -> ExercisePatch {
    let mut patch = ExercisePatch::default();
    if existing.enabled != candidate.enabled {
        patch.enabled = Some(candidate.enabled);
    }
    if existing.primary_muscle_group_id != candidate.primary_muscle_group_id {
        patch.primary_muscle_group_id = Some(candidate.primary_muscle_group_id);
    }
    if !set_eq(
        &existing.secondary_muscle_group_ids,
        &candidate.secondary_muscle_group_ids,
    ) {
        patch.secondary_muscle_group_ids = Some(candidate.secondary_muscle_group_ids.clone());
    }
    if !set_eq(&existing.equipment_ids, &candidate.equipment_ids) {
        patch.equipment_ids = Some(candidate.equipment_ids.clone());
    }
    patch
}

/// Resolves muscle-group names to ids, auto-vivifying missing groups.
///
/// Muscle groups are an open taxonomy: a name first seen during an import
/// is created on the spot, registered in the reference index, and reused by
/// every later row in the same batch.
struct MuscleGroupResolver<'a, S: CatalogStore> {
    store: &'a S,
    index: IdentityIndex<MuscleGroup>,
    created: usize,
}

impl<'a, S: CatalogStore> MuscleGroupResolver<'a, S> {
    async fn load(store: &'a S) -> Result<Self, AppError> {
        let groups = store.list_muscle_groups().await?;
        Ok(Self {
            store,
            index: IdentityIndex::build(groups),
            created: 0,
        })
    }

    async fn resolve(&mut self, name: &str) -> Result<i32, AppError> {
        let name = name.trim();
        if let Some(found) = self.index.get(name) {
            return Ok(found.id);
        }
        match self.store.create_muscle_group(name).await {
            Ok(created) => {
                debug!(muscle_group = name, id = created.id, "Auto-created muscle group");
                self.created += 1;
                let id = created.id;
                self.index.insert(created);
                Ok(id)
            }
            Err(e) if e.is_duplicate() => {
                // a concurrent writer created it first; adopt theirs
                match self.store.get_muscle_group_by_name(name).await? {
                    Some(found) => {
                        let id = found.id;
                        self.index.insert(found);
                        Ok(id)
                    }
                    None => Err(AppError::Generic(format!(
                        "muscle group '{}' reported duplicate but not found on re-query",
                        name
                    ))),
                }
            }
            Err(e) => Err(e),
        }
    }
}

/// Drives import and sync runs against a catalog store.
pub struct CatalogSyncService<S: CatalogStore> {
    store: S,
    config: SyncConfig,
}

impl<S: CatalogStore> CatalogSyncService<S> {
    /// Creates a service with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, SyncConfig::default())
    }

    pub fn with_config(store: S, config: SyncConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // Equipment ------------------------------------------------------------

    /// Imports equipment records (CSV-sourced) with CDC semantics.
    ///
    /// Rows with blank names are counted as skipped. Existing equipment is
    /// updated when the description or enabled flag differs.
    pub async fn import_equipment(
        &self,
        records: &[RawEquipmentRecord],
        mode: SyncMode,
    ) -> Result<RunReport, AppError> {
        info!(records = records.len(), ?mode, "Starting equipment import");
        let mut report = RunReport::with_cap(self.config.max_report_errors);
        let mut index = self.equipment_index(mode).await?;

        for record in records {
            self.process_equipment_record(
                record,
                &mut index,
                &mut report,
                BlankNamePolicy::CountSkipped,
                true,
            )
            .await;
        }

        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            errors = report.error_count,
            "Equipment import finished"
        );
        Ok(report.finish("Import completed"))
    }

    /// Syncs equipment from the external source.
    ///
    /// Deliberately create-only: existing equipment is never updated by the
    /// Wger feed (the feed has no enabled flag or description to diff), and
    /// records with blank names are dropped without counting. A fetch
    /// failure ends the run but the report accumulated so far is returned.
    pub async fn sync_equipment<C: ExternalCatalog>(
        &self,
        source: &C,
        mode: SyncMode,
    ) -> Result<RunReport, AppError> {
        info!(?mode, "Starting equipment sync");
        let mut report = RunReport::with_cap(self.config.max_report_errors);
        let mut index = self.equipment_index(mode).await?;

        let mut cursor: Option<String> = None;
        loop {
            let page = match source.equipment_page(cursor.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, "Equipment sync aborted by fetch failure");
                    return Ok(report
                        .fail_fetch("Failed to fetch equipment from Wger API", e.to_string()));
                }
            };
            for record in &page.items {
                self.process_equipment_record(
                    record,
                    &mut index,
                    &mut report,
                    BlankNamePolicy::Ignore,
                    false,
                )
                .await;
            }
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(
            created = report.created,
            skipped = report.skipped,
            errors = report.error_count,
            "Equipment sync finished"
        );
        Ok(report.finish("Sync completed"))
    }

    async fn equipment_index(&self, mode: SyncMode) -> Result<IdentityIndex<Equipment>, AppError> {
        if mode == SyncMode::FullResync {
            self.delete_all_equipment().await?;
            Ok(IdentityIndex::new())
        } else {
            let existing = self.store.list_equipment(self.config.list_limit).await?;
            Ok(IdentityIndex::build(existing))
        }
    }

    async fn delete_all_equipment(&self) -> Result<(), AppError> {
        let existing = self.store.list_equipment(self.config.list_limit).await?;
        info!(count = existing.len(), "Full resync: deleting existing equipment");
        for equipment in existing {
            self.store.delete_equipment(equipment.id).await?;
        }
        Ok(())
    }

    async fn process_equipment_record(
        &self,
        record: &RawEquipmentRecord,
        index: &mut IdentityIndex<Equipment>,
        report: &mut RunReport,
        blank_policy: BlankNamePolicy,
        allow_updates: bool,
    ) {
        let Some(candidate) = normalize::normalize_equipment(record) else {
            match blank_policy {
                BlankNamePolicy::CountSkipped => report.record(RowOutcome::Skipped),
                BlankNamePolicy::Ignore => {}
                BlankNamePolicy::RecordError => report.record_error(format!(
                    "{}: missing name",
                    normalize::row_label(record.line, &record.name)
                )),
            }
            return;
        };

        match self
            .reconcile_equipment(candidate, index, allow_updates)
            .await
        {
            Ok(outcome) => report.record(outcome),
            Err(e) => report.record_error(format!(
                "{}: {}",
                normalize::row_label(record.line, &record.name),
                e
            )),
        }
    }

    async fn reconcile_equipment(
        &self,
        candidate: NewEquipment,
        index: &mut IdentityIndex<Equipment>,
        allow_updates: bool,
    ) -> Result<RowOutcome, AppError> {
        if let Some(existing) = index.get(&candidate.name).cloned() {
            if !allow_updates {
                return Ok(RowOutcome::Skipped);
            }
            let patch = diff_equipment(&existing, &candidate);
            if patch.is_empty() {
                return Ok(RowOutcome::Skipped);
            }
            self.store.update_equipment(existing.id, &patch).await?;
            let mut refreshed = existing;
            patch.apply_to(&mut refreshed);
            index.insert(refreshed);
            return Ok(RowOutcome::Updated);
        }

        match self.store.create_equipment(&candidate).await {
            Ok(created) => {
                index.insert(created);
                Ok(RowOutcome::Created)
            }
            Err(e) if e.is_duplicate() => {
                // a concurrent writer created the same name since the index
                // was built; treat as already present
                match self.store.get_equipment_by_name(&candidate.name).await? {
                    Some(found) => {
                        index.insert(found);
                        Ok(RowOutcome::Skipped)
                    }
                    None => Err(AppError::Generic(format!(
                        "equipment '{}' reported duplicate but not found on re-query",
                        candidate.name
                    ))),
                }
            }
            Err(e) => Err(e),
        }
    }

    // Exercises ------------------------------------------------------------

    /// Imports exercise records (CSV-sourced) with CDC semantics.
    ///
    /// Rows with blank names are recorded as errors. Muscle-group references
    /// are auto-vivified; equipment references must pre-exist or the row is
    /// rejected.
    pub async fn import_exercises(
        &self,
        records: &[RawExerciseRecord],
        mode: SyncMode,
    ) -> Result<RunReport, AppError> {
        info!(records = records.len(), ?mode, "Starting exercise import");
        let mut report = RunReport::with_cap(self.config.max_report_errors);
        let mut index = self.exercise_index(mode).await?;
        let mut muscle_groups = MuscleGroupResolver::load(&self.store).await?;
        let equipment_index =
            IdentityIndex::build(self.store.list_equipment(self.config.list_limit).await?);

        for record in records {
            self.process_exercise_record(
                record,
                &mut index,
                &mut muscle_groups,
                &equipment_index,
                &mut report,
            )
            .await;
        }

        report.muscle_groups_created = muscle_groups.created;
        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            errors = report.error_count,
            muscle_groups_created = report.muscle_groups_created,
            "Exercise import finished"
        );
        Ok(report.finish("Import completed"))
    }

    /// Syncs exercises from the external source, updating existing
    /// exercises on diff. A fetch failure ends the run but the accumulated
    /// report is returned.
    pub async fn sync_exercises<C: ExternalCatalog>(
        &self,
        source: &C,
        mode: SyncMode,
    ) -> Result<RunReport, AppError> {
        info!(?mode, "Starting exercise sync");
        let mut report = RunReport::with_cap(self.config.max_report_errors);
        let mut index = self.exercise_index(mode).await?;
        let mut muscle_groups = MuscleGroupResolver::load(&self.store).await?;
        let equipment_index =
            IdentityIndex::build(self.store.list_equipment(self.config.list_limit).await?);

        let mut cursor: Option<String> = None;
        loop {
            let page = match source.exercise_page(cursor.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, "Exercise sync aborted by fetch failure");
                    report.muscle_groups_created = muscle_groups.created;
                    return Ok(report
                        .fail_fetch("Failed to fetch exercises from Wger API", e.to_string()));
                }
            };
            for record in &page.items {
                self.process_exercise_record(
                    record,
                    &mut index,
                    &mut muscle_groups,
                    &equipment_index,
                    &mut report,
                )
                .await;
            }
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        report.muscle_groups_created = muscle_groups.created;
        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            errors = report.error_count,
            muscle_groups_created = report.muscle_groups_created,
            "Exercise sync finished"
        );
        Ok(report.finish("Sync completed"))
    }

    async fn exercise_index(&self, mode: SyncMode) -> Result<IdentityIndex<Exercise>, AppError> {
        if mode == SyncMode::FullResync {
            self.delete_all_exercises().await?;
            Ok(IdentityIndex::new())
        } else {
            let existing = self.store.list_exercises(self.config.list_limit).await?;
            Ok(IdentityIndex::build(existing))
        }
    }

    /// Deletes every exercise. Muscle groups are left untouched: a full
    /// exercise resync must not erase the taxonomy they reference.
    async fn delete_all_exercises(&self) -> Result<(), AppError> {
        let existing = self.store.list_exercises(self.config.list_limit).await?;
        info!(count = existing.len(), "Full resync: deleting existing exercises");
        for exercise in existing {
            self.store.delete_exercise(exercise.id).await?;
        }
        Ok(())
    }

    async fn process_exercise_record(
        &self,
        record: &RawExerciseRecord,
        index: &mut IdentityIndex<Exercise>,
        muscle_groups: &mut MuscleGroupResolver<'_, S>,
        equipment_index: &IdentityIndex<Equipment>,
        report: &mut RunReport,
    ) {
        let Some(name) = normalize::clean_name(&record.name) else {
            let label = match record.line {
                Some(n) => format!("Row {}", n),
                None => "unnamed record".to_string(),
            };
            report.record_error(format!("{}: missing exercise name", label));
            return;
        };

        let result = async {
            let candidate = self
                .normalize_exercise(name, record, muscle_groups, equipment_index)
                .await?;
            self.reconcile_exercise(candidate, index).await
        }
        .await;

        match result {
            Ok(outcome) => report.record(outcome),
            Err(e) => report.record_error(format!(
                "{}: {}",
                normalize::row_label(record.line, name),
                e
            )),
        }
    }

    /// Builds a canonical exercise candidate: every reference field is a
    /// valid internal id by the time it reaches the reconciler.
    async fn normalize_exercise(
        &self,
        name: &str,
        record: &RawExerciseRecord,
        muscle_groups: &mut MuscleGroupResolver<'_, S>,
        equipment_index: &IdentityIndex<Equipment>,
    ) -> Result<NewExercise, AppError> {
        let primary_muscle_group_id = match record
            .primary_muscle_group
            .as_deref()
            .and_then(normalize::clean_name)
        {
            Some(group) => Some(muscle_groups.resolve(group).await?),
            None => None,
        };

        let mut secondary_muscle_group_ids = Vec::new();
        for raw in &record.secondary_muscle_groups {
            if let Some(group) = normalize::clean_name(raw) {
                let id = muscle_groups.resolve(group).await?;
                if !secondary_muscle_group_ids.contains(&id) {
                    secondary_muscle_group_ids.push(id);
                }
            }
        }

        // equipment is a curated list: unresolvable references reject the row
        let mut equipment_ids = Vec::new();
        for raw in &record.equipment {
            if let Some(equipment_name) = normalize::clean_name(raw) {
                let equipment = equipment_index.get(equipment_name).ok_or_else(|| {
                    AppError::EntityNotFound(format!("equipment '{}'", equipment_name))
                })?;
                if !equipment_ids.contains(&equipment.id) {
                    equipment_ids.push(equipment.id);
                }
            }
        }

        Ok(NewExercise {
            name: name.to_string(),
            enabled: normalize::parse_enabled(record.enabled.as_deref()),
            primary_muscle_group_id,
            secondary_muscle_group_ids,
            equipment_ids,
        })
    }

    async fn reconcile_exercise(
        &self,
        candidate: NewExercise,
        index: &mut IdentityIndex<Exercise>,
    ) -> Result<RowOutcome, AppError> {
        if let Some(existing) = index.get(&candidate.name).cloned() {
            let patch = diff_exercise(&existing, &candidate);
            if patch.is_empty() {
                return Ok(RowOutcome::Skipped);
            }
            self.store.update_exercise(existing.id, &patch).await?;
            let mut refreshed = existing;
            patch.apply_to(&mut refreshed);
            index.insert(refreshed);
            return Ok(RowOutcome::Updated);
        }

        match self.store.create_exercise(&candidate).await {
            Ok(created) => {
                index.insert(created);
                Ok(RowOutcome::Created)
            }
            Err(e) if e.is_duplicate() => {
                match self.store.get_exercise_by_name(&candidate.name).await? {
                    Some(found) => {
                        index.insert(found);
                        Ok(RowOutcome::Skipped)
                    }
                    None => Err(AppError::Generic(format!(
                        "exercise '{}' reported duplicate but not found on re-query",
                        candidate.name
                    ))),
                }
            }
            Err(e) => Err(e),
        }
    }

    // Exercise-equipment linkage -------------------------------------------

    /// Idempotent N:M replace of an exercise's equipment links.
    ///
    /// Only the symmetric difference between the current and desired id
    /// sets is written: removed ids are unlinked, added ids are linked,
    /// unchanged links are not touched.
    pub async fn set_equipment_for_exercise(
        &self,
        exercise_id: i32,
        desired: &[i32],
    ) -> Result<(), AppError> {
        let current: HashSet<i32> = self
            .store
            .equipment_ids_for_exercise(exercise_id)
            .await?
            .into_iter()
            .collect();
        let desired: HashSet<i32> = desired.iter().copied().collect();

        for &equipment_id in current.difference(&desired) {
            self.store.unlink_equipment(exercise_id, equipment_id).await?;
        }
        for &equipment_id in desired.difference(&current) {
            self.store.link_equipment(exercise_id, equipment_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogStats;
    use crate::traits::SourcePage;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store with hooks for injecting per-name failures and
    /// simulating a concurrent duplicate-create race.
    #[derive(Default)]
    struct MockStore {
        equipment: Mutex<Vec<Equipment>>,
        exercises: Mutex<Vec<Exercise>>,
        muscle_groups: Mutex<Vec<MuscleGroup>>,
        links: Mutex<HashSet<(i32, i32)>>,
        next_id: AtomicI32,
        /// Creates/updates naming this entity fail with a generic error.
        fail_on_name: Mutex<Option<String>>,
        /// The first create for this name behaves as if a concurrent writer
        /// won the race: the row appears, but the call reports a duplicate.
        race_on_name: Mutex<Option<String>>,
        link_calls: AtomicUsize,
        unlink_calls: AtomicUsize,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                next_id: AtomicI32::new(1),
                ..Default::default()
            }
        }

        fn alloc_id(&self) -> i32 {
            self.next_id.fetch_add(1, Ordering::SeqCst)
        }

        fn fail_on(&self, name: &str) {
            *self.fail_on_name.lock().unwrap() = Some(name.to_lowercase());
        }

        fn race_on(&self, name: &str) {
            *self.race_on_name.lock().unwrap() = Some(name.to_lowercase());
        }

        fn check_fail(&self, name: &str) -> Result<(), AppError> {
            if self.fail_on_name.lock().unwrap().as_deref() == Some(&name.to_lowercase()[..]) {
                return Err(AppError::Generic("injected store failure".to_string()));
            }
            Ok(())
        }

        fn seed_equipment(&self, name: &str, description: Option<&str>, enabled: bool) -> i32 {
            let id = self.alloc_id();
            self.equipment.lock().unwrap().push(Equipment {
                id,
                name: name.to_string(),
                description: description.map(str::to_string),
                enabled,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
            id
        }

        fn seed_muscle_group(&self, name: &str) -> i32 {
            let id = self.alloc_id();
            self.muscle_groups.lock().unwrap().push(MuscleGroup {
                id,
                name: name.to_string(),
            });
            id
        }

        fn seed_exercise(&self, new: &NewExercise) -> i32 {
            let id = self.alloc_id();
            self.exercises.lock().unwrap().push(Exercise {
                id,
                name: new.name.clone(),
                enabled: new.enabled,
                primary_muscle_group_id: new.primary_muscle_group_id,
                secondary_muscle_group_ids: new.secondary_muscle_group_ids.clone(),
                equipment_ids: new.equipment_ids.clone(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
            id
        }
    }

    #[async_trait]
    impl CatalogStore for MockStore {
        async fn list_equipment(&self, limit: i64) -> Result<Vec<Equipment>, AppError> {
            let items = self.equipment.lock().unwrap();
            Ok(items.iter().take(limit as usize).cloned().collect())
        }

        async fn get_equipment_by_name(&self, name: &str) -> Result<Option<Equipment>, AppError> {
            let items = self.equipment.lock().unwrap();
            Ok(items
                .iter()
                .find(|e| e.name.eq_ignore_ascii_case(name))
                .cloned())
        }

        async fn create_equipment(&self, new: &NewEquipment) -> Result<Equipment, AppError> {
            self.check_fail(&new.name)?;

            let race = {
                let mut flag = self.race_on_name.lock().unwrap();
                if flag.as_deref() == Some(&new.name.to_lowercase()[..]) {
                    flag.take();
                    true
                } else {
                    false
                }
            };

            let mut items = self.equipment.lock().unwrap();
            if race || items.iter().any(|e| e.name.eq_ignore_ascii_case(&new.name)) {
                if race {
                    // the concurrent writer's row lands anyway
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                    items.push(Equipment {
                        id,
                        name: new.name.clone(),
                        description: new.description.clone(),
                        enabled: new.enabled,
                        created_at: Utc::now(),
                        updated_at: Utc::now(),
                    });
                }
                return Err(AppError::DuplicateName(new.name.clone()));
            }

            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let created = Equipment {
                id,
                name: new.name.clone(),
                description: new.description.clone(),
                enabled: new.enabled,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            items.push(created.clone());
            Ok(created)
        }

        async fn update_equipment(&self, id: i32, patch: &EquipmentPatch) -> Result<(), AppError> {
            let mut items = self.equipment.lock().unwrap();
            let equipment = items
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| AppError::EntityNotFound(format!("equipment id {}", id)))?;
            if self.fail_on_name.lock().unwrap().as_deref()
                == Some(&equipment.name.to_lowercase()[..])
            {
                return Err(AppError::Generic("injected store failure".to_string()));
            }
            patch.apply_to(equipment);
            Ok(())
        }

        async fn delete_equipment(&self, id: i32) -> Result<(), AppError> {
            self.equipment.lock().unwrap().retain(|e| e.id != id);
            self.links.lock().unwrap().retain(|&(_, eq)| eq != id);
            Ok(())
        }

        async fn list_exercises(&self, limit: i64) -> Result<Vec<Exercise>, AppError> {
            let items = self.exercises.lock().unwrap();
            Ok(items.iter().take(limit as usize).cloned().collect())
        }

        async fn get_exercise_by_name(&self, name: &str) -> Result<Option<Exercise>, AppError> {
            let items = self.exercises.lock().unwrap();
            Ok(items
                .iter()
                .find(|e| e.name.eq_ignore_ascii_case(name))
                .cloned())
        }

        async fn create_exercise(&self, new: &NewExercise) -> Result<Exercise, AppError> {
            self.check_fail(&new.name)?;

            let race = {
                let mut flag = self.race_on_name.lock().unwrap();
                if flag.as_deref() == Some(&new.name.to_lowercase()[..]) {
                    flag.take();
                    true
                } else {
                    false
                }
            };

            let mut items = self.exercises.lock().unwrap();
            if race || items.iter().any(|e| e.name.eq_ignore_ascii_case(&new.name)) {
                if race {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                    items.push(Exercise {
                        id,
                        name: new.name.clone(),
                        enabled: new.enabled,
                        primary_muscle_group_id: new.primary_muscle_group_id,
                        secondary_muscle_group_ids: new.secondary_muscle_group_ids.clone(),
                        equipment_ids: new.equipment_ids.clone(),
                        created_at: Utc::now(),
                        updated_at: Utc::now(),
                    });
                }
                return Err(AppError::DuplicateName(new.name.clone()));
            }

            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let created = Exercise {
                id,
                name: new.name.clone(),
                enabled: new.enabled,
                primary_muscle_group_id: new.primary_muscle_group_id,
                secondary_muscle_group_ids: new.secondary_muscle_group_ids.clone(),
                equipment_ids: new.equipment_ids.clone(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            items.push(created.clone());
            Ok(created)
        }

        async fn update_exercise(&self, id: i32, patch: &ExercisePatch) -> Result<(), AppError> {
            let mut items = self.exercises.lock().unwrap();
            let exercise = items
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| AppError::EntityNotFound(format!("exercise id {}", id)))?;
            if self.fail_on_name.lock().unwrap().as_deref()
                == Some(&exercise.name.to_lowercase()[..])
            {
                return Err(AppError::Generic("injected store failure".to_string()));
            }
            patch.apply_to(exercise);
            Ok(())
        }

        async fn delete_exercise(&self, id: i32) -> Result<(), AppError> {
            self.exercises.lock().unwrap().retain(|e| e.id != id);
            self.links.lock().unwrap().retain(|&(ex, _)| ex != id);
            Ok(())
        }

        async fn list_muscle_groups(&self) -> Result<Vec<MuscleGroup>, AppError> {
            Ok(self.muscle_groups.lock().unwrap().clone())
        }

        async fn get_muscle_group_by_name(
            &self,
            name: &str,
        ) -> Result<Option<MuscleGroup>, AppError> {
            let items = self.muscle_groups.lock().unwrap();
            Ok(items
                .iter()
                .find(|g| g.name.eq_ignore_ascii_case(name))
                .cloned())
        }

        async fn create_muscle_group(&self, name: &str) -> Result<MuscleGroup, AppError> {
            let mut items = self.muscle_groups.lock().unwrap();
            if items.iter().any(|g| g.name.eq_ignore_ascii_case(name)) {
                return Err(AppError::DuplicateName(name.to_string()));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let created = MuscleGroup {
                id,
                name: name.to_string(),
            };
            items.push(created.clone());
            Ok(created)
        }

        async fn equipment_ids_for_exercise(&self, exercise_id: i32) -> Result<Vec<i32>, AppError> {
            let links = self.links.lock().unwrap();
            Ok(links
                .iter()
                .filter(|&&(ex, _)| ex == exercise_id)
                .map(|&(_, eq)| eq)
                .collect())
        }

        async fn link_equipment(&self, exercise_id: i32, equipment_id: i32) -> Result<(), AppError> {
            self.link_calls.fetch_add(1, Ordering::SeqCst);
            self.links.lock().unwrap().insert((exercise_id, equipment_id));
            Ok(())
        }

        async fn unlink_equipment(
            &self,
            exercise_id: i32,
            equipment_id: i32,
        ) -> Result<(), AppError> {
            self.unlink_calls.fetch_add(1, Ordering::SeqCst);
            self.links.lock().unwrap().remove(&(exercise_id, equipment_id));
            Ok(())
        }

        async fn get_stats(&self) -> Result<CatalogStats, AppError> {
            Ok(CatalogStats {
                equipment: self.equipment.lock().unwrap().len() as i64,
                exercises: self.exercises.lock().unwrap().len() as i64,
                muscle_groups: self.muscle_groups.lock().unwrap().len() as i64,
            })
        }
    }

    /// Paginated source backed by fixed pages; cursors are page indices.
    #[derive(Default)]
    struct MockSource {
        equipment_pages: Vec<Vec<RawEquipmentRecord>>,
        exercise_pages: Vec<Vec<RawExerciseRecord>>,
        fail_at_page: Option<usize>,
    }

    impl MockSource {
        fn page_index(cursor: Option<&str>) -> usize {
            cursor.and_then(|c| c.parse().ok()).unwrap_or(0)
        }

        fn next_cursor(&self, index: usize, total: usize) -> Option<String> {
            if index + 1 < total {
                Some((index + 1).to_string())
            } else {
                None
            }
        }
    }

    #[async_trait]
    impl ExternalCatalog for MockSource {
        async fn equipment_page(
            &self,
            cursor: Option<&str>,
        ) -> Result<SourcePage<RawEquipmentRecord>, AppError> {
            let index = Self::page_index(cursor);
            if self.fail_at_page == Some(index) {
                return Err(AppError::ClientError("HTTP 503 from wger".to_string()));
            }
            Ok(SourcePage {
                items: self.equipment_pages[index].clone(),
                next: self.next_cursor(index, self.equipment_pages.len()),
            })
        }

        async fn exercise_page(
            &self,
            cursor: Option<&str>,
        ) -> Result<SourcePage<RawExerciseRecord>, AppError> {
            let index = Self::page_index(cursor);
            if self.fail_at_page == Some(index) {
                return Err(AppError::ClientError("HTTP 503 from wger".to_string()));
            }
            Ok(SourcePage {
                items: self.exercise_pages[index].clone(),
                next: self.next_cursor(index, self.exercise_pages.len()),
            })
        }
    }

    fn raw_equipment(name: &str, description: Option<&str>, enabled: Option<&str>) -> RawEquipmentRecord {
        RawEquipmentRecord {
            line: None,
            name: name.to_string(),
            description: description.map(str::to_string),
            enabled: enabled.map(str::to_string),
        }
    }

    fn csv_equipment(line: usize, name: &str, enabled: &str) -> RawEquipmentRecord {
        RawEquipmentRecord {
            line: Some(line),
            name: name.to_string(),
            description: None,
            enabled: Some(enabled.to_string()),
        }
    }

    fn raw_exercise(line: Option<usize>, name: &str) -> RawExerciseRecord {
        RawExerciseRecord {
            line,
            name: name.to_string(),
            ..Default::default()
        }
    }

    // Equipment import -----------------------------------------------------

    #[tokio::test]
    async fn test_case_change_triggers_update_not_duplicate() {
        // "Band" then "band": the second row matches case-insensitively and
        // its enabled flag change becomes an update, not a second create.
        let service = CatalogSyncService::new(MockStore::new());
        let records = vec![
            csv_equipment(2, "Band", "true"),
            csv_equipment(3, "band", "false"),
        ];

        let report = service
            .import_equipment(&records, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.error_count, 0);

        let stored = service.store().equipment.lock().unwrap().clone();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Band");
        assert!(!stored[0].enabled);
    }

    #[tokio::test]
    async fn test_equipment_import_is_idempotent() {
        let service = CatalogSyncService::new(MockStore::new());
        let records = vec![
            RawEquipmentRecord {
                line: Some(2),
                name: "Barbell".to_string(),
                description: Some("Olympic bar".to_string()),
                enabled: Some("true".to_string()),
            },
            csv_equipment(3, "Band", "false"),
        ];

        let first = service
            .import_equipment(&records, SyncMode::Incremental)
            .await
            .unwrap();
        assert_eq!(first.created, 2);

        let second = service
            .import_equipment(&records, SyncMode::Incremental)
            .await
            .unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.skipped, 2);
    }

    #[tokio::test]
    async fn test_case_insensitive_match_against_existing_store() {
        let store = MockStore::new();
        store.seed_equipment("barbell", None, true);
        let service = CatalogSyncService::new(store);

        let records = vec![csv_equipment(2, "Barbell", "true")];
        let report = service
            .import_equipment(&records, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(service.store().equipment.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_equipment_name_is_counted_skipped() {
        let service = CatalogSyncService::new(MockStore::new());
        let records = vec![csv_equipment(2, "  ", "true"), csv_equipment(3, "Band", "true")];

        let report = service
            .import_equipment(&records, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.error_count, 0);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let store = MockStore::new();
        store.fail_on("Kettlebell");
        let service = CatalogSyncService::new(store);

        let records = vec![
            csv_equipment(2, "Band", "true"),
            csv_equipment(3, "Kettlebell", "true"),
            csv_equipment(4, "Barbell", "true"),
        ];
        let report = service
            .import_equipment(&records, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Row 3:"));
    }

    #[tokio::test]
    async fn test_duplicate_create_race_downgrades_to_skip() {
        let store = MockStore::new();
        store.race_on("Band");
        let service = CatalogSyncService::new(store);

        let records = vec![csv_equipment(2, "Band", "true")];
        let report = service
            .import_equipment(&records, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.error_count, 0);
        // exactly one logical entity survives the race
        assert_eq!(service.store().equipment.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_equipment_full_resync_replaces_collection() {
        let store = MockStore::new();
        store.seed_equipment("Old machine", None, true);
        let service = CatalogSyncService::new(store);

        let records = vec![csv_equipment(2, "Band", "true")];
        let report = service
            .import_equipment(&records, SyncMode::FullResync)
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        let stored = service.store().equipment.lock().unwrap().clone();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Band");
    }

    // Equipment sync -------------------------------------------------------

    #[tokio::test]
    async fn test_wger_equipment_sync_never_updates_existing() {
        let store = MockStore::new();
        store.seed_equipment("Band", Some("kept description"), false);
        let service = CatalogSyncService::new(store);

        let source = MockSource {
            equipment_pages: vec![vec![
                raw_equipment("Band", None, None),
                raw_equipment("Kettlebell", None, None),
            ]],
            ..Default::default()
        };
        let report = service
            .sync_equipment(&source, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(report.skipped, 1);

        let stored = service.store().equipment.lock().unwrap().clone();
        let band = stored.iter().find(|e| e.name == "Band").unwrap();
        assert_eq!(band.description.as_deref(), Some("kept description"));
        assert!(!band.enabled);
    }

    #[tokio::test]
    async fn test_equipment_sync_follows_pagination() {
        let service = CatalogSyncService::new(MockStore::new());
        let source = MockSource {
            equipment_pages: vec![
                vec![raw_equipment("Band", None, None)],
                vec![raw_equipment("Kettlebell", None, None)],
                vec![raw_equipment("Barbell", None, None)],
            ],
            ..Default::default()
        };

        let report = service
            .sync_equipment(&source, SyncMode::Incremental)
            .await
            .unwrap();
        assert_eq!(report.created, 3);
        assert_eq!(report.message, "Sync completed");
    }

    #[tokio::test]
    async fn test_fetch_failure_returns_partial_report() {
        let service = CatalogSyncService::new(MockStore::new());
        let source = MockSource {
            equipment_pages: vec![
                vec![
                    raw_equipment("Band", None, None),
                    raw_equipment("Kettlebell", None, None),
                ],
                vec![raw_equipment("Never reached", None, None)],
            ],
            fail_at_page: Some(1),
            ..Default::default()
        };

        let report = service
            .sync_equipment(&source, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.message, "Failed to fetch equipment from Wger API");
        assert!(report.fetch_error.as_deref().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_wger_blank_equipment_name_dropped_without_counting() {
        let service = CatalogSyncService::new(MockStore::new());
        let source = MockSource {
            equipment_pages: vec![vec![
                raw_equipment("", None, None),
                raw_equipment("Band", None, None),
            ]],
            ..Default::default()
        };

        let report = service
            .sync_equipment(&source, SyncMode::Incremental)
            .await
            .unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.total(), 1);
    }

    // Exercise import ------------------------------------------------------

    #[tokio::test]
    async fn test_exercise_auto_vivifies_muscle_group_once_per_batch() {
        let service = CatalogSyncService::new(MockStore::new());
        let records = vec![
            RawExerciseRecord {
                line: Some(2),
                name: "Pull-up".to_string(),
                primary_muscle_group: Some("Lats".to_string()),
                ..Default::default()
            },
            RawExerciseRecord {
                line: Some(3),
                name: "Row".to_string(),
                primary_muscle_group: Some("lats".to_string()),
                secondary_muscle_groups: vec!["Biceps".to_string()],
                ..Default::default()
            },
        ];

        let report = service
            .import_exercises(&records, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.muscle_groups_created, 2); // Lats + Biceps

        let groups = service.store().muscle_groups.lock().unwrap().clone();
        let lats: Vec<_> = groups
            .iter()
            .filter(|g| g.name.eq_ignore_ascii_case("lats"))
            .collect();
        assert_eq!(lats.len(), 1);

        let exercises = service.store().exercises.lock().unwrap().clone();
        let lats_id = lats[0].id;
        assert!(exercises
            .iter()
            .all(|e| e.primary_muscle_group_id == Some(lats_id)));
    }

    #[tokio::test]
    async fn test_secondary_muscle_group_order_is_ignored() {
        let store = MockStore::new();
        let back = store.seed_muscle_group("Back");
        let hams = store.seed_muscle_group("Hamstrings");
        let glutes = store.seed_muscle_group("Glutes");
        store.seed_exercise(&NewExercise {
            name: "Deadlift".to_string(),
            enabled: true,
            primary_muscle_group_id: Some(back),
            secondary_muscle_group_ids: vec![glutes, hams],
            equipment_ids: vec![],
        });
        let service = CatalogSyncService::new(store);

        let records = vec![RawExerciseRecord {
            line: Some(2),
            name: "Deadlift".to_string(),
            enabled: Some("true".to_string()),
            primary_muscle_group: Some("Back".to_string()),
            secondary_muscle_groups: vec!["Hamstrings".to_string(), "Glutes".to_string()],
            equipment: vec![],
        }];
        let report = service
            .import_exercises(&records, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(report.muscle_groups_created, 0);
    }

    #[tokio::test]
    async fn test_blank_exercise_name_records_error() {
        let service = CatalogSyncService::new(MockStore::new());
        let records = vec![raw_exercise(Some(2), "  "), raw_exercise(Some(3), "Squat")];

        let report = service
            .import_exercises(&records, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.error_count, 1);
        assert!(report.errors[0].contains("Row 2"));
        assert!(report.errors[0].contains("missing exercise name"));
    }

    #[tokio::test]
    async fn test_unresolvable_equipment_rejects_row() {
        let service = CatalogSyncService::new(MockStore::new());
        let records = vec![RawExerciseRecord {
            line: Some(2),
            name: "Bench press".to_string(),
            equipment: vec!["Barbell".to_string()],
            ..Default::default()
        }];

        let report = service
            .import_exercises(&records, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.error_count, 1);
        assert!(report.errors[0].contains("equipment 'Barbell'"));
        assert!(service.store().exercises.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exercise_import_is_idempotent() {
        let store = MockStore::new();
        store.seed_equipment("Barbell", None, true);
        let service = CatalogSyncService::new(store);

        let records = vec![RawExerciseRecord {
            line: Some(2),
            name: "Deadlift".to_string(),
            enabled: Some("true".to_string()),
            primary_muscle_group: Some("Back".to_string()),
            secondary_muscle_groups: vec!["Hamstrings".to_string()],
            equipment: vec!["Barbell".to_string()],
        }];

        let first = service
            .import_exercises(&records, SyncMode::Incremental)
            .await
            .unwrap();
        assert_eq!(first.created, 1);
        assert_eq!(first.muscle_groups_created, 2);

        let second = service
            .import_exercises(&records, SyncMode::Incremental)
            .await
            .unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(second.muscle_groups_created, 0);
    }

    #[tokio::test]
    async fn test_full_resync_preserves_muscle_groups() {
        let store = MockStore::new();
        let back = store.seed_muscle_group("Back");
        let chest = store.seed_muscle_group("Chest");
        store.seed_exercise(&NewExercise {
            name: "Old exercise".to_string(),
            enabled: true,
            primary_muscle_group_id: Some(back),
            secondary_muscle_group_ids: vec![],
            equipment_ids: vec![],
        });
        let service = CatalogSyncService::new(store);

        let records = vec![RawExerciseRecord {
            line: Some(2),
            name: "Bench press".to_string(),
            primary_muscle_group: Some("Chest".to_string()),
            ..Default::default()
        }];
        let report = service
            .import_exercises(&records, SyncMode::FullResync)
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.muscle_groups_created, 0);

        let exercises = service.store().exercises.lock().unwrap().clone();
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].name, "Bench press");

        // muscle group ids survive untouched
        let groups = service.store().muscle_groups.lock().unwrap().clone();
        let ids: Vec<i32> = groups.iter().map(|g| g.id).collect();
        assert!(ids.contains(&back));
        assert!(ids.contains(&chest));
    }

    #[tokio::test]
    async fn test_error_list_capped_while_processing_continues() {
        let service = CatalogSyncService::new(MockStore::new());
        let mut records: Vec<RawExerciseRecord> =
            (0..100).map(|i| raw_exercise(Some(i + 2), "")).collect();
        records.push(raw_exercise(Some(102), "Squat"));

        let report = service
            .import_exercises(&records, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.error_count, 100);
        assert_eq!(report.errors.len(), 50);
        // the row after the 100 bad ones was still processed
        assert_eq!(report.created, 1);
    }

    // Exercise sync --------------------------------------------------------

    #[tokio::test]
    async fn test_exercise_sync_updates_on_diff() {
        let store = MockStore::new();
        let chest = store.seed_muscle_group("Chest");
        store.seed_exercise(&NewExercise {
            name: "Push-up".to_string(),
            enabled: true,
            primary_muscle_group_id: Some(chest),
            secondary_muscle_group_ids: vec![],
            equipment_ids: vec![],
        });
        let service = CatalogSyncService::new(store);

        let source = MockSource {
            exercise_pages: vec![vec![RawExerciseRecord {
                line: None,
                name: "Push-up".to_string(),
                primary_muscle_group: Some("Chest".to_string()),
                secondary_muscle_groups: vec!["Triceps".to_string()],
                ..Default::default()
            }]],
            ..Default::default()
        };
        let report = service
            .sync_exercises(&source, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.muscle_groups_created, 1);

        let exercises = service.store().exercises.lock().unwrap().clone();
        assert_eq!(exercises[0].secondary_muscle_group_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_exercise_sync_fetch_failure_keeps_muscle_group_counter() {
        let service = CatalogSyncService::new(MockStore::new());
        let source = MockSource {
            exercise_pages: vec![
                vec![RawExerciseRecord {
                    line: None,
                    name: "Pull-up".to_string(),
                    primary_muscle_group: Some("Lats".to_string()),
                    ..Default::default()
                }],
                vec![],
            ],
            fail_at_page: Some(1),
            ..Default::default()
        };

        let report = service
            .sync_exercises(&source, SyncMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.muscle_groups_created, 1);
        assert!(report.fetch_error.is_some());
    }

    // Linkage replace ------------------------------------------------------

    #[tokio::test]
    async fn test_set_equipment_replace_writes_only_symmetric_difference() {
        let store = MockStore::new();
        store.links.lock().unwrap().insert((1, 10));
        store.links.lock().unwrap().insert((1, 11));
        let service = CatalogSyncService::new(store);

        service
            .set_equipment_for_exercise(1, &[11, 12])
            .await
            .unwrap();

        assert_eq!(service.store().unlink_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.store().link_calls.load(Ordering::SeqCst), 1);

        let links = service.store().links.lock().unwrap().clone();
        assert_eq!(links, HashSet::from([(1, 11), (1, 12)]));
    }

    #[tokio::test]
    async fn test_set_equipment_replace_is_idempotent() {
        let store = MockStore::new();
        store.links.lock().unwrap().insert((1, 10));
        let service = CatalogSyncService::new(store);

        service.set_equipment_for_exercise(1, &[10]).await.unwrap();

        assert_eq!(service.store().unlink_calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.store().link_calls.load(Ordering::SeqCst), 0);
    }

    // Diff helpers ---------------------------------------------------------

    #[test]
    fn test_diff_equipment_detects_changes() {
        let existing = Equipment {
            id: 1,
            name: "Band".to_string(),
            description: Some("old".to_string()),
            enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let candidate = NewEquipment {
            name: "Band".to_string(),
            description: Some("old".to_string()),
            enabled: false,
        };
        let patch = diff_equipment(&existing, &candidate);
        assert!(patch.description.is_none());
        assert_eq!(patch.enabled, Some(false));
    }

    #[test]
    fn test_diff_exercise_set_equality() {
        let existing = Exercise {
            id: 1,
            name: "Deadlift".to_string(),
            enabled: true,
            primary_muscle_group_id: Some(1),
            secondary_muscle_group_ids: vec![3, 2],
            equipment_ids: vec![5],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let candidate = NewExercise {
            name: "Deadlift".to_string(),
            enabled: true,
            primary_muscle_group_id: Some(1),
            secondary_muscle_group_ids: vec![2, 3],
            equipment_ids: vec![5],
        };
        assert!(diff_exercise(&existing, &candidate).is_empty());
    }
}
