//! XpTransaction entity - the append-only XP ledger
//!
//! Rows are never updated or deleted. Count-based achievement conditions are
//! answered by counting rows per `(user_id, source)` instead of maintaining
//! denormalized counters.

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Origin activity of an XP transaction.
#[derive(
  Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum XpSource {
  #[sea_orm(string_value = "card_created")]
  CardCreated,
  #[sea_orm(string_value = "review_completed")]
  ReviewCompleted,
  #[sea_orm(string_value = "deck_created")]
  DeckCreated,
  #[sea_orm(string_value = "daily_goal")]
  DailyGoal,
  #[sea_orm(string_value = "achievement")]
  Achievement,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "xp_transactions")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub user_id: i64,
  pub amount: i64,
  pub source: XpSource,
  pub source_id: Option<String>,
  pub description: String,
  pub created_at: NaiveDateTime,
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
