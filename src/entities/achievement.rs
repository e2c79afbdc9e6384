//! Achievement entity - the read-only achievement catalog

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rarity bucket; each tier carries its own reward-range policy.
#[derive(
  Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Tier {
  #[sea_orm(string_value = "bronze")]
  Bronze,
  #[sea_orm(string_value = "silver")]
  Silver,
  #[sea_orm(string_value = "gold")]
  Gold,
  #[sea_orm(string_value = "platinum")]
  Platinum,
  #[sea_orm(string_value = "diamond")]
  Diamond,
}

impl Default for Tier {
  fn default() -> Self {
    Self::Bronze
  }
}

/// Closed set of achievement condition kinds.
#[derive(
  Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
  #[sea_orm(string_value = "streak")]
  Streak,
  #[sea_orm(string_value = "daily_goal")]
  DailyGoal,
  #[sea_orm(string_value = "reviews_completed")]
  ReviewsCompleted,
  #[sea_orm(string_value = "cards_created")]
  CardsCreated,
  #[sea_orm(string_value = "deck_created")]
  DeckCreated,
  #[sea_orm(string_value = "xp_total")]
  XpTotal,
  #[sea_orm(string_value = "level_reached")]
  LevelReached,
  #[sea_orm(string_value = "custom")]
  Custom,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievements")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub name: String,
  pub description: String,
  pub tier: Tier,
  pub xp_reward: i64,
  pub icon: String,
  pub condition_type: ConditionType,
  pub condition_target: i64,
  /// Registered evaluator name, for `custom` conditions only.
  pub condition_metric: Option<String>,
  pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::user_achievement::Entity")]
  UserAchievements,
}

impl Related<super::user_achievement::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::UserAchievements.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
