//! Catalog service - achievement definitions, seeding and validation
//!
//! The catalog is written by an offline seeding pass and is read-only to the
//! engine. Numeric fields arrive as floats from seed data and are rounded to
//! integers on write; malformed definitions are rejected outright.

use sea_orm::{
  ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
  QueryOrder, Set,
};
use serde::Deserialize;

use crate::entities::achievement;
use crate::entities::prelude::*;
use crate::error::{AppError, AppResult};

/// Raw achievement definition as it appears in seed data.
#[derive(Debug, Clone, Deserialize)]
pub struct AchievementDef {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub tier: Tier,
  pub xp_reward: f64,
  #[serde(default)]
  pub icon: String,
  pub condition_type: ConditionType,
  pub target: f64,
  #[serde(default)]
  pub metric: Option<String>,
  #[serde(default = "default_active")]
  pub is_active: bool,
}

fn default_active() -> bool {
  true
}

pub struct CatalogService;

impl CatalogService {
  /// Upsert one validated definition.
  pub async fn upsert(db: &DatabaseConnection, def: &AchievementDef) -> AppResult<AchievementModel> {
    let (id, name, xp_reward, target) = Self::validate(def)?;

    let model = AchievementActiveModel {
      id: Set(id.clone()),
      name: Set(name),
      description: Set(def.description.trim().to_string()),
      tier: Set(def.tier),
      xp_reward: Set(xp_reward),
      icon: Set(def.icon.clone()),
      condition_type: Set(def.condition_type),
      condition_target: Set(target),
      condition_metric: Set(def.metric.clone()),
      is_active: Set(def.is_active),
    };

    let saved = match Achievement::find_by_id(id.as_str()).one(db).await? {
      Some(_) => model.update(db).await?,
      None => model.insert(db).await?,
    };
    Ok(saved)
  }

  /// Upsert a batch of definitions; fails on the first invalid one.
  pub async fn seed(db: &DatabaseConnection, defs: &[AchievementDef]) -> AppResult<usize> {
    for def in defs {
      Self::upsert(db, def).await?;
    }
    Ok(defs.len())
  }

  /// Seed the built-in catalog if the table is empty.
  pub async fn seed_defaults(db: &DatabaseConnection) -> AppResult<usize> {
    if Achievement::find().count(db).await? > 0 {
      return Ok(0);
    }
    Self::seed(db, &Self::default_catalog()).await
  }

  pub async fn get(db: &DatabaseConnection, id: &str) -> AppResult<AchievementModel> {
    Achievement::find_by_id(id)
      .one(db)
      .await?
      .ok_or(AppError::AchievementNotFound)
  }

  /// Active achievements in catalog order (by id), optionally filtered by
  /// condition type.
  pub async fn list_active(
    db: &DatabaseConnection,
    types: Option<&[ConditionType]>,
  ) -> AppResult<Vec<AchievementModel>> {
    let mut query = Achievement::find()
      .filter(achievement::Column::IsActive.eq(true))
      .order_by_asc(achievement::Column::Id);

    if let Some(types) = types {
      query = query.filter(achievement::Column::ConditionType.is_in(types.iter().copied()));
    }

    let achievements = query.all(db).await?;
    Ok(achievements)
  }

  fn validate(def: &AchievementDef) -> AppResult<(String, String, i64, i64)> {
    let id = def.id.trim().to_string();
    let name = def.name.trim().to_string();
    if id.is_empty() {
      return Err(AppError::Invalid("achievement id is empty".into()));
    }
    if name.is_empty() {
      return Err(AppError::Invalid("achievement name is empty".into()));
    }

    if !def.xp_reward.is_finite() || def.xp_reward < 0.0 {
      return Err(AppError::Invalid(format!("bad xp_reward for {id}: {}", def.xp_reward)));
    }
    if !def.target.is_finite() {
      return Err(AppError::Invalid(format!("bad target for {id}: {}", def.target)));
    }

    // Validate the rounded value so targets like 0.4 cannot slip in as 0.
    let target = def.target.round() as i64;
    if target <= 0 {
      return Err(AppError::Invalid(format!("bad target for {id}: {}", def.target)));
    }

    Ok((id, name, def.xp_reward.round() as i64, target))
  }

  /// The shipped achievement set: tiered streak, review, card and level
  /// milestones.
  pub fn default_catalog() -> Vec<AchievementDef> {
    fn def(
      id: &str,
      name: &str,
      tier: Tier,
      xp_reward: f64,
      condition_type: ConditionType,
      target: f64,
    ) -> AchievementDef {
      AchievementDef {
        id: id.into(),
        name: name.into(),
        description: String::new(),
        tier,
        xp_reward,
        icon: String::new(),
        condition_type,
        target,
        metric: None,
        is_active: true,
      }
    }

    vec![
      def("cards_10", "Card Collector", Tier::Bronze, 25.0, ConditionType::CardsCreated, 10.0),
      def("cards_100", "Card Architect", Tier::Silver, 100.0, ConditionType::CardsCreated, 100.0),
      def("deck_1", "Deck Builder", Tier::Bronze, 20.0, ConditionType::DeckCreated, 1.0),
      def("goal_7", "Goal Getter", Tier::Silver, 75.0, ConditionType::DailyGoal, 7.0),
      def("level_5", "Apprentice", Tier::Bronze, 50.0, ConditionType::LevelReached, 5.0),
      def("level_20", "Scholar", Tier::Gold, 250.0, ConditionType::LevelReached, 20.0),
      def("reviews_5", "Getting Started", Tier::Bronze, 25.0, ConditionType::ReviewsCompleted, 5.0),
      def("reviews_50", "Dedicated", Tier::Silver, 100.0, ConditionType::ReviewsCompleted, 50.0),
      def("reviews_500", "Relentless", Tier::Platinum, 500.0, ConditionType::ReviewsCompleted, 500.0),
      def("streak_3", "Warming Up", Tier::Bronze, 30.0, ConditionType::Streak, 3.0),
      def("streak_7", "One Week Strong", Tier::Silver, 100.0, ConditionType::Streak, 7.0),
      def("streak_30", "Unstoppable", Tier::Gold, 400.0, ConditionType::Streak, 30.0),
      def("streak_365", "Year of Study", Tier::Diamond, 2000.0, ConditionType::Streak, 365.0),
      def("xp_1000", "Point Hoarder", Tier::Silver, 100.0, ConditionType::XpTotal, 1000.0),
      def("xp_10000", "XP Magnate", Tier::Platinum, 500.0, ConditionType::XpTotal, 10000.0),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::testing::setup_test_db;

  fn sample() -> AchievementDef {
    AchievementDef {
      id: "  streak_3  ".into(),
      name: " Warming Up ".into(),
      description: "Three days in a row".into(),
      tier: Tier::Bronze,
      xp_reward: 30.4,
      icon: "flame".into(),
      condition_type: ConditionType::Streak,
      target: 3.0,
      metric: None,
      is_active: true,
    }
  }

  #[tokio::test]
  async fn upsert_trims_and_rounds() {
    let db = setup_test_db().await;

    let saved = CatalogService::upsert(&db, &sample()).await.unwrap();
    assert_eq!(saved.id, "streak_3");
    assert_eq!(saved.name, "Warming Up");
    assert_eq!(saved.xp_reward, 30);
    assert_eq!(saved.condition_target, 3);
  }

  #[tokio::test]
  async fn rejects_empty_and_non_finite() {
    let db = setup_test_db().await;

    let mut bad = sample();
    bad.id = "   ".into();
    assert!(matches!(CatalogService::upsert(&db, &bad).await, Err(AppError::Invalid(_))));

    let mut bad = sample();
    bad.xp_reward = f64::NAN;
    assert!(matches!(CatalogService::upsert(&db, &bad).await, Err(AppError::Invalid(_))));

    let mut bad = sample();
    bad.target = 0.0;
    assert!(matches!(CatalogService::upsert(&db, &bad).await, Err(AppError::Invalid(_))));

    // Rounds to zero, so it must be rejected too.
    let mut bad = sample();
    bad.target = 0.4;
    assert!(matches!(CatalogService::upsert(&db, &bad).await, Err(AppError::Invalid(_))));
  }

  #[tokio::test]
  async fn list_active_filters_by_type() {
    let db = setup_test_db().await;
    CatalogService::seed_defaults(&db).await.unwrap();

    let streaks = CatalogService::list_active(&db, Some(&[ConditionType::Streak])).await.unwrap();
    assert!(!streaks.is_empty());
    assert!(streaks.iter().all(|a| a.condition_type == ConditionType::Streak));

    // Catalog order is id order.
    let all = CatalogService::list_active(&db, None).await.unwrap();
    let mut ids: Vec<_> = all.iter().map(|a| a.id.clone()).collect();
    let sorted = {
      ids.sort();
      ids
    };
    assert_eq!(sorted, all.iter().map(|a| a.id.clone()).collect::<Vec<_>>());
  }

  #[tokio::test]
  async fn seed_defaults_is_idempotent() {
    let db = setup_test_db().await;

    let first = CatalogService::seed_defaults(&db).await.unwrap();
    assert!(first > 0);
    let second = CatalogService::seed_defaults(&db).await.unwrap();
    assert_eq!(second, 0);
  }
}
