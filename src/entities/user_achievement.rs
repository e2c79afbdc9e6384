//! UserAchievement entity - per (user, achievement) unlock state

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invariant: `unlocked_at` set implies `progress == 100`, and once set it is
/// never cleared.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_achievements")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i64,
  #[sea_orm(primary_key, auto_increment = false)]
  pub achievement_id: String,
  pub unlocked_at: Option<NaiveDateTime>,
  pub progress: i32,
  pub claimed: bool,
  pub notification_seen: bool,
  pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::user::Entity",
    from = "Column::UserId",
    to = "super::user::Column::Id"
  )]
  User,
  #[sea_orm(
    belongs_to = "super::achievement::Entity",
    from = "Column::AchievementId",
    to = "super::achievement::Column::Id"
  )]
  Achievement,
}

impl Related<super::user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<super::achievement::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Achievement.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
