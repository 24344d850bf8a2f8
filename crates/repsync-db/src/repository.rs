//! Catalog repository for PostgreSQL.
//!
//! Natural-key uniqueness is enforced by unique indexes on `LOWER(name)`;
//! a violation surfaces as `AppError::DuplicateName` so the reconciliation
//! engine can recover from concurrent-create races. Exercise writes that
//! touch reference links run in a transaction, so a failed row never leaves
//! partial links behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use repsync_core::error::AppError;
use repsync_core::models::{
    CatalogStats, Equipment, EquipmentPatch, Exercise, ExercisePatch, MuscleGroup, NewEquipment,
    NewExercise,
};
use repsync_core::traits::CatalogStore;
use sqlx::{PgPool, Pool, Postgres, QueryBuilder};
use std::collections::HashSet;

/// Column list for equipment SELECT queries. Must remain a const literal to
/// ensure SQL safety since format!() bypasses sqlx compile-time validation.
const EQUIPMENT_COLUMNS: &str = "id, name, description, enabled, created_at, updated_at";

/// Exercise SELECT with reference-id lists aggregated from the link tables.
const EXERCISE_SELECT: &str = r#"
    SELECT
        e.id,
        e.name,
        e.enabled,
        e.primary_muscle_group_id,
        e.created_at,
        e.updated_at,
        COALESCE(
            array_agg(DISTINCT s.muscle_group_id)
                FILTER (WHERE s.muscle_group_id IS NOT NULL),
            '{}'
        ) AS secondary_muscle_group_ids,
        COALESCE(
            array_agg(DISTINCT q.equipment_id)
                FILTER (WHERE q.equipment_id IS NOT NULL),
            '{}'
        ) AS equipment_ids
    FROM exercises e
    LEFT JOIN exercise_secondary_muscle_groups s ON s.exercise_id = e.id
    LEFT JOIN exercise_equipment q ON q.exercise_id = e.id
"#;

/// Repository for catalog persistence in PostgreSQL.
///
/// # Examples
///
/// ```no_run
/// use sqlx::postgres::PgPoolOptions;
/// use repsync_db::CatalogRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PgPoolOptions::new()
///     .max_connections(5)
///     .connect("postgresql://localhost/repsync")
///     .await?;
///
/// let repo = CatalogRepository::new(pool);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CatalogRepository {
    pool: Pool<Postgres>,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Maps a unique-index violation to `DuplicateName`, anything else to
    /// the plain database error.
    fn map_create_error(e: sqlx::Error, name: &str) -> AppError {
        if let sqlx::Error::Database(db) = &e {
            if db.code().as_deref() == Some("23505") {
                return AppError::DuplicateName(name.to_string());
            }
        }
        AppError::DatabaseError(e)
    }
}

/// Helper struct for deserializing exercise query results.
#[derive(sqlx::FromRow)]
struct ExerciseRow {
    id: i32,
    name: String,
    enabled: bool,
    primary_muscle_group_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    secondary_muscle_group_ids: Vec<i32>,
    equipment_ids: Vec<i32>,
}

impl From<ExerciseRow> for Exercise {
    fn from(row: ExerciseRow) -> Self {
        Exercise {
            id: row.id,
            name: row.name,
            enabled: row.enabled,
            primary_muscle_group_id: row.primary_muscle_group_id,
            secondary_muscle_group_ids: row.secondary_muscle_group_ids,
            equipment_ids: row.equipment_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Helper struct for deserializing stats query results.
#[derive(sqlx::FromRow)]
struct StatsRow {
    equipment: Option<i64>,
    exercises: Option<i64>,
    muscle_groups: Option<i64>,
}

/// Replaces the rows of a link table for one exercise, writing only the
/// symmetric difference between current and desired id sets.
async fn replace_links(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    table: &str,
    id_column: &str,
    exercise_id: i32,
    desired: &[i32],
) -> Result<(), AppError> {
    // table/id_column come from const call sites, never user input
    let current: Vec<(i32,)> =
        sqlx::query_as(&format!(
            "SELECT {} FROM {} WHERE exercise_id = $1",
            id_column, table
        ))
        .bind(exercise_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(AppError::DatabaseError)?;

    let current: HashSet<i32> = current.into_iter().map(|(id,)| id).collect();
    let desired: HashSet<i32> = desired.iter().copied().collect();

    for &id in current.difference(&desired) {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE exercise_id = $1 AND {} = $2",
            table, id_column
        ))
        .bind(exercise_id)
        .bind(id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::DatabaseError)?;
    }
    for &id in desired.difference(&current) {
        sqlx::query(&format!(
            "INSERT INTO {} (exercise_id, {}) VALUES ($1, $2)",
            table, id_column
        ))
        .bind(exercise_id)
        .bind(id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::DatabaseError)?;
    }
    Ok(())
}

#[async_trait]
impl CatalogStore for CatalogRepository {
    // Equipment ------------------------------------------------------------

    async fn list_equipment(&self, limit: i64) -> Result<Vec<Equipment>, AppError> {
        let query = format!(
            "SELECT {} FROM equipment ORDER BY name LIMIT $1",
            EQUIPMENT_COLUMNS
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    async fn get_equipment_by_name(&self, name: &str) -> Result<Option<Equipment>, AppError> {
        let query = format!(
            "SELECT {} FROM equipment WHERE LOWER(name) = LOWER($1)",
            EQUIPMENT_COLUMNS
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    async fn create_equipment(&self, new: &NewEquipment) -> Result<Equipment, AppError> {
        let query = format!(
            r#"
            INSERT INTO equipment (name, description, enabled)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            EQUIPMENT_COLUMNS
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(&new.name)
            .bind(&new.description)
            .bind(new.enabled)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::map_create_error(e, &new.name))
    }

    async fn update_equipment(&self, id: i32, patch: &EquipmentPatch) -> Result<(), AppError> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE equipment SET ");
        let mut parts = builder.separated(", ");
        if let Some(description) = &patch.description {
            parts.push("description = ").push_bind_unseparated(description.clone());
        }
        if let Some(enabled) = patch.enabled {
            parts.push("enabled = ").push_bind_unseparated(enabled);
        }
        parts.push("updated_at = NOW()");
        builder.push(" WHERE id = ").push_bind(id);

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(())
    }

    async fn delete_equipment(&self, id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(())
    }

    // Exercises ------------------------------------------------------------

    async fn list_exercises(&self, limit: i64) -> Result<Vec<Exercise>, AppError> {
        let query = format!("{} GROUP BY e.id ORDER BY e.name LIMIT $1", EXERCISE_SELECT);
        let rows = sqlx::query_as::<_, ExerciseRow>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(rows.into_iter().map(Exercise::from).collect())
    }

    async fn get_exercise_by_name(&self, name: &str) -> Result<Option<Exercise>, AppError> {
        let query = format!(
            "{} WHERE LOWER(e.name) = LOWER($1) GROUP BY e.id",
            EXERCISE_SELECT
        );
        let row = sqlx::query_as::<_, ExerciseRow>(&query)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(row.map(Exercise::from))
    }

    async fn create_exercise(&self, new: &NewExercise) -> Result<Exercise, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::DatabaseError)?;

        let row: (i32, DateTime<Utc>, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO exercises (name, enabled, primary_muscle_group_id)
            VALUES ($1, $2, $3)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(&new.name)
        .bind(new.enabled)
        .bind(new.primary_muscle_group_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| Self::map_create_error(e, &new.name))?;

        let id = row.0;
        replace_links(
            &mut tx,
            "exercise_secondary_muscle_groups",
            "muscle_group_id",
            id,
            &new.secondary_muscle_group_ids,
        )
        .await?;
        replace_links(
            &mut tx,
            "exercise_equipment",
            "equipment_id",
            id,
            &new.equipment_ids,
        )
        .await?;

        tx.commit().await.map_err(AppError::DatabaseError)?;

        Ok(Exercise {
            id,
            name: new.name.clone(),
            enabled: new.enabled,
            primary_muscle_group_id: new.primary_muscle_group_id,
            secondary_muscle_group_ids: new.secondary_muscle_group_ids.clone(),
            equipment_ids: new.equipment_ids.clone(),
            created_at: row.1,
            updated_at: row.2,
        })
    }

    async fn update_exercise(&self, id: i32, patch: &ExercisePatch) -> Result<(), AppError> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(AppError::DatabaseError)?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exercises SET ");
        let mut parts = builder.separated(", ");
        if let Some(enabled) = patch.enabled {
            parts.push("enabled = ").push_bind_unseparated(enabled);
        }
        if let Some(primary) = patch.primary_muscle_group_id {
            parts
                .push("primary_muscle_group_id = ")
                .push_bind_unseparated(primary);
        }
        parts.push("updated_at = NOW()");
        builder.push(" WHERE id = ").push_bind(id);
        builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(AppError::DatabaseError)?;

        if let Some(secondary) = &patch.secondary_muscle_group_ids {
            replace_links(
                &mut tx,
                "exercise_secondary_muscle_groups",
                "muscle_group_id",
                id,
                secondary,
            )
            .await?;
        }
        if let Some(equipment) = &patch.equipment_ids {
            replace_links(&mut tx, "exercise_equipment", "equipment_id", id, equipment).await?;
        }

        tx.commit().await.map_err(AppError::DatabaseError)
    }

    async fn delete_exercise(&self, id: i32) -> Result<(), AppError> {
        // link rows go with it via ON DELETE CASCADE
        sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(())
    }

    // Muscle groups --------------------------------------------------------

    async fn list_muscle_groups(&self) -> Result<Vec<MuscleGroup>, AppError> {
        sqlx::query_as::<_, MuscleGroup>("SELECT id, name FROM muscle_groups ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    async fn get_muscle_group_by_name(&self, name: &str) -> Result<Option<MuscleGroup>, AppError> {
        sqlx::query_as::<_, MuscleGroup>(
            "SELECT id, name FROM muscle_groups WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    async fn create_muscle_group(&self, name: &str) -> Result<MuscleGroup, AppError> {
        sqlx::query_as::<_, MuscleGroup>(
            "INSERT INTO muscle_groups (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_create_error(e, name))
    }

    // Exercise-equipment links ---------------------------------------------

    async fn equipment_ids_for_exercise(&self, exercise_id: i32) -> Result<Vec<i32>, AppError> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            "SELECT equipment_id FROM exercise_equipment WHERE exercise_id = $1",
        )
        .bind(exercise_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn link_equipment(&self, exercise_id: i32, equipment_id: i32) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO exercise_equipment (exercise_id, equipment_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(exercise_id)
        .bind(equipment_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;
        Ok(())
    }

    async fn unlink_equipment(&self, exercise_id: i32, equipment_id: i32) -> Result<(), AppError> {
        sqlx::query(
            "DELETE FROM exercise_equipment WHERE exercise_id = $1 AND equipment_id = $2",
        )
        .bind(exercise_id)
        .bind(equipment_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;
        Ok(())
    }

    // Stats ----------------------------------------------------------------

    async fn get_stats(&self) -> Result<CatalogStats, AppError> {
        let row: StatsRow = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM equipment) as equipment,
                (SELECT COUNT(*) FROM exercises) as exercises,
                (SELECT COUNT(*) FROM muscle_groups) as muscle_groups
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(CatalogStats {
            equipment: row.equipment.unwrap_or(0),
            exercises: row.exercises.unwrap_or(0),
            muscle_groups: row.muscle_groups.unwrap_or(0),
        })
    }
}
