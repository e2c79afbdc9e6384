use sea_orm_migration::MigratorTrait;

use crate::migration::Migrator;
use crate::prelude::*;
use crate::services::CatalogService;
use crate::services::achievement::MetricRegistry;
use crate::services::progress::SessionRules;
use crate::services::xp::LevelCurve;

#[derive(Debug, Clone, Default)]
pub struct Config {
  pub rules: SessionRules,
  pub curve: LevelCurve,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  /// Custom-metric evaluators, registered by the embedding application.
  pub metrics: MetricRegistry,
}

impl AppState {
  pub async fn new(db_url: &str) -> Self {
    Self::with_config(db_url, Config::default()).await
  }

  pub async fn with_config(db_url: &str, config: Config) -> Self {
    info!("Connecting to database...");
    let db = Database::connect(db_url).await.expect("Failed to connect to database");

    info!("Running migrations...");
    Migrator::up(&db, None).await.expect("Failed to run migrations");

    let seeded = CatalogService::seed_defaults(&db).await.expect("Failed to seed catalog");
    if seeded > 0 {
      info!(seeded, "Seeded default achievement catalog");
    }

    Self { db, config, metrics: MetricRegistry::default() }
  }
}
