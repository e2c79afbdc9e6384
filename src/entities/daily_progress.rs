//! DailyProgress entity - per (user, day) activity feed
//!
//! The raw daily signal that streak continuity and ranking aggregation read
//! from. `date` is an ISO `YYYY-MM-DD` day key.

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_progress")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i64,
  #[sea_orm(primary_key, auto_increment = false)]
  pub date: String,
  pub cards_reviewed: i32,
  pub cards_correct: i32,
  pub goal_met: bool,
  pub xp_earned: i64,
  pub study_time_minutes: i32,
  pub study_sessions: i32,
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
}

impl Related<super::user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
