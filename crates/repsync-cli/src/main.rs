use std::path::Path;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use repsync_cli::{CatalogKind, Command, Config};
use repsync_client::WgerClient;
use repsync_core::{
    csv_parser, load_sources_config, CatalogStore, CatalogSyncService, DbConfig, Equipment,
    RunReport, SyncMode,
};
use repsync_db::CatalogRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Setup logging (stderr to keep stdout clean for reports and exports)
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    // Parse command line arguments
    let config = Config::parse();

    // Database connection
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(DbConfig::default().max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let repo = CatalogRepository::new(pool);
    let service = CatalogSyncService::new(repo);

    // Execute command
    match config.command {
        Command::ImportEquipment { file, full_sync } => {
            import_equipment(&service, &file, sync_mode(full_sync)).await?;
        }
        Command::ImportExercises { file, full_sync } => {
            import_exercises(&service, &file, sync_mode(full_sync)).await?;
        }
        Command::SyncWger {
            kind,
            full_sync,
            config,
        } => {
            sync_wger(&service, kind, sync_mode(full_sync), config.as_deref()).await?;
        }
        Command::ExportEquipment => {
            export_equipment(&service).await?;
        }
        Command::Stats => {
            show_stats(&service).await?;
        }
    }

    Ok(())
}

fn sync_mode(full_sync: bool) -> SyncMode {
    if full_sync {
        SyncMode::FullResync
    } else {
        SyncMode::Incremental
    }
}

/// Import equipment from a CSV file
async fn import_equipment(
    service: &CatalogSyncService<CatalogRepository>,
    file: &Path,
    mode: SyncMode,
) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let records = csv_parser::parse_equipment_csv(&contents)?;

    let report = service.import_equipment(&records, mode).await?;
    print_report(&report)
}

/// Import exercises from a CSV file
async fn import_exercises(
    service: &CatalogSyncService<CatalogRepository>,
    file: &Path,
    mode: SyncMode,
) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let records = csv_parser::parse_exercise_csv(&contents)?;

    let report = service.import_exercises(&records, mode).await?;
    print_report(&report)
}

/// Sync a catalog kind from the Wger API
async fn sync_wger(
    service: &CatalogSyncService<CatalogRepository>,
    kind: CatalogKind,
    mode: SyncMode,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let sources = load_sources_config(config_path)?;
    let client = WgerClient::new(&sources.wger.base_url).context("Invalid Wger API URL")?;

    let report = match kind {
        CatalogKind::Equipment => service.sync_equipment(&client, mode).await?,
        CatalogKind::Exercises => service.sync_exercises(&client, mode).await?,
    };
    print_report(&report)
}

/// Print a run report as pretty JSON on stdout
fn print_report(report: &RunReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

/// Export the equipment catalog as CSV to stdout
async fn export_equipment(service: &CatalogSyncService<CatalogRepository>) -> anyhow::Result<()> {
    let equipment = service.store().list_equipment(10_000).await?;

    if equipment.is_empty() {
        eprintln!("No equipment found to export.");
        return Ok(());
    }

    // header matches what import-equipment expects, so exports round-trip
    println!("name,description,enabled");
    for item in &equipment {
        println!("{}", equipment_csv_row(item));
    }

    info!("Export complete: {} equipment entries", equipment.len());
    Ok(())
}

fn equipment_csv_row(equipment: &Equipment) -> String {
    let description = equipment
        .description
        .as_ref()
        .map(|d| escape_csv(d))
        .unwrap_or_default();

    format!(
        "{},{},{}",
        escape_csv(&equipment.name),
        description,
        equipment.enabled,
    )
}

/// Show catalog statistics
async fn show_stats(service: &CatalogSyncService<CatalogRepository>) -> anyhow::Result<()> {
    let stats = service.store().get_stats().await?;

    println!("\nCatalog Statistics\n");
    println!("  Equipment:      {}", stats.equipment);
    println!("  Exercises:      {}", stats.exercises);
    println!("  Muscle groups:  {}", stats.muscle_groups);
    println!();

    Ok(())
}

/// Escape a string for CSV output
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
