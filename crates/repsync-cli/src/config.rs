use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "repsync")]
#[command(
    author,
    version,
    about = "Catalog import and sync tool for the workout database"
)]
#[command(after_help = "Examples:
  repsync import-equipment equipment.csv
  repsync import-exercises exercises.csv --full-sync
  repsync sync-wger equipment
  repsync export-equipment > equipment.csv
  repsync stats")]
pub struct Config {
    /// PostgreSQL database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import equipment from a CSV file
    #[command(after_help = "Expected columns: name, description, enabled")]
    ImportEquipment {
        /// Path to the CSV file
        file: PathBuf,

        /// Delete all existing equipment before importing
        #[arg(long)]
        full_sync: bool,
    },
    /// Import exercises from a CSV file
    #[command(after_help = "Expected columns: name, enabled, primary_muscle_group, \
secondary_muscle_groups, equipment (multi-value cells separated by ';')")]
    ImportExercises {
        /// Path to the CSV file
        file: PathBuf,

        /// Delete all existing exercises before importing
        #[arg(long)]
        full_sync: bool,
    },
    /// Sync a catalog kind from the Wger exercise database API
    #[command(after_help = "Examples:
  repsync sync-wger equipment
  repsync sync-wger exercises --full-sync
  repsync sync-wger exercises --config ~/sources.toml")]
    SyncWger {
        /// Which catalog kind to sync
        kind: CatalogKind,

        /// Delete all existing entities of this kind before syncing
        #[arg(long)]
        full_sync: bool,

        /// Custom path to the sources.toml configuration file
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Export the equipment catalog as CSV to stdout
    ExportEquipment,
    /// Show catalog statistics
    Stats,
}

/// Catalog kinds that can be synced from Wger
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CatalogKind {
    Equipment,
    Exercises,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_equipment() {
        let config = Config::try_parse_from([
            "repsync",
            "--database-url",
            "postgres://localhost/repsync",
            "import-equipment",
            "equipment.csv",
            "--full-sync",
        ])
        .unwrap();

        match config.command {
            Command::ImportEquipment { file, full_sync } => {
                assert_eq!(file, PathBuf::from("equipment.csv"));
                assert!(full_sync);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_sync_wger_kind() {
        let config = Config::try_parse_from([
            "repsync",
            "--database-url",
            "postgres://localhost/repsync",
            "sync-wger",
            "exercises",
        ])
        .unwrap();

        match config.command {
            Command::SyncWger {
                kind, full_sync, config,
            } => {
                assert!(matches!(kind, CatalogKind::Exercises));
                assert!(!full_sync);
                assert!(config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
