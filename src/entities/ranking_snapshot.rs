//! RankingSnapshot entity - periodic leaderboard snapshots
//!
//! Keyed by `(period, date)` where `date` is the period key (`YYYY-MM` for
//! monthly, `YYYY` for yearly). Each aggregation run replaces the snapshot
//! wholesale; entries are stored as a JSON array.

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Period {
  #[sea_orm(string_value = "monthly")]
  Monthly,
  #[sea_orm(string_value = "yearly")]
  Yearly,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ranking_snapshots")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub period: Period,
  #[sea_orm(primary_key, auto_increment = false)]
  pub date: String,
  pub entries: Json,
  pub total_participants: i32,
  pub last_updated: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
