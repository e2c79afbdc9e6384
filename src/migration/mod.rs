//! Database migrations using SeaORM

use sea_orm_migration::prelude::*;

mod m20260826_000001_create_users;
mod m20260826_000002_create_achievements;
mod m20260826_000003_create_user_progress;
mod m20260826_000004_create_user_achievements;
mod m20260826_000005_create_xp_transactions;
mod m20260826_000006_create_daily_progress;
mod m20260826_000007_create_streaks;
mod m20260826_000008_create_ranking_snapshots;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260826_000001_create_users::Migration),
      Box::new(m20260826_000002_create_achievements::Migration),
      Box::new(m20260826_000003_create_user_progress::Migration),
      Box::new(m20260826_000004_create_user_achievements::Migration),
      Box::new(m20260826_000005_create_xp_transactions::Migration),
      Box::new(m20260826_000006_create_daily_progress::Migration),
      Box::new(m20260826_000007_create_streaks::Migration),
      Box::new(m20260826_000008_create_ranking_snapshots::Migration),
    ]
  }
}
