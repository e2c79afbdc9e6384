//! User entity - profile carrier for gamification state

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: i64,
  pub username: Option<String>,
  /// Push-notification token, consumed by the out-of-process notifier.
  pub push_token: Option<String>,
  pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_one = "super::user_progress::Entity")]
  Progress,
  #[sea_orm(has_many = "super::user_achievement::Entity")]
  Achievements,
  #[sea_orm(has_many = "super::xp_transaction::Entity")]
  XpTransactions,
  #[sea_orm(has_one = "super::streak::Entity")]
  Streak,
}

impl Related<super::user_progress::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Progress.def()
  }
}

impl Related<super::user_achievement::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Achievements.def()
  }
}

impl Related<super::xp_transaction::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::XpTransactions.def()
  }
}

impl Related<super::streak::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Streak.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
