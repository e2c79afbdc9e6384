//! Achievement engine - condition evaluation and the atomic unlock protocol
//!
//! Conditions are evaluated against the ledger, the streak state and the
//! progress singleton; every comparison is inclusive (`actual >= target`).
//! Unlocking is guarded by a single DB transaction around the
//! `(user, achievement)` row: read, branch on `unlocked_at`, conditional
//! write. That transaction is the only concurrency-correctness mechanism in
//! the engine. The reward XP credit runs after the transaction commits, so a
//! crash in between leaves an unlocked-but-uncredited achievement; the
//! unlock write stays the idempotence anchor either way.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use sea_orm::{
  ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
  TransactionTrait,
};

use crate::entities::prelude::*;
use crate::entities::user_achievement;
use crate::error::AppResult;
use crate::services::xp::{LevelCurve, XpService};
use crate::services::{CatalogService, StreakService, UserService};

/// Evaluator for a bespoke metric behind a `custom` condition (unique decks
/// studied, profile completion and the like). Registered by the embedding
/// application.
#[async_trait::async_trait]
pub trait CustomMetric: Send + Sync {
  async fn evaluate(&self, db: &DatabaseConnection, user_id: i64) -> AppResult<i64>;
}

/// Registry mapping metric name to evaluator. A `custom` condition whose
/// metric is unregistered evaluates to unmet, never to an error.
#[derive(Default)]
pub struct MetricRegistry {
  metrics: DashMap<String, Arc<dyn CustomMetric>>,
}

impl MetricRegistry {
  pub fn register(&self, name: impl Into<String>, metric: Arc<dyn CustomMetric>) {
    self.metrics.insert(name.into(), metric);
  }

  pub async fn evaluate(
    &self,
    name: &str,
    db: &DatabaseConnection,
    user_id: i64,
  ) -> AppResult<Option<i64>> {
    let Some(metric) = self.metrics.get(name).map(|entry| entry.value().clone()) else {
      return Ok(None);
    };
    metric.evaluate(db, user_id).await.map(Some)
  }
}

pub struct AchievementEngine;

impl AchievementEngine {
  /// Evaluate every not-yet-unlocked active achievement (optionally filtered
  /// by condition type) and unlock the satisfied ones.
  ///
  /// Returns the newly unlocked achievements in catalog order. Each unlock
  /// is one atomic write plus one XP credit.
  pub async fn check_achievements(
    db: &DatabaseConnection,
    curve: &LevelCurve,
    metrics: &MetricRegistry,
    user_id: i64,
    types: Option<&[ConditionType]>,
  ) -> AppResult<Vec<AchievementModel>> {
    let candidates = CatalogService::list_active(db, types).await?;

    let unlocked_ids: std::collections::HashSet<String> = UserAchievement::find()
      .filter(user_achievement::Column::UserId.eq(user_id))
      .filter(user_achievement::Column::UnlockedAt.is_not_null())
      .all(db)
      .await?
      .into_iter()
      .map(|row| row.achievement_id)
      .collect();

    let mut newly_unlocked = Vec::new();
    for achievement in candidates {
      if unlocked_ids.contains(&achievement.id) {
        continue;
      }
      if Self::check_achievement(db, metrics, user_id, &achievement).await? {
        let was_new = Self::unlock_achievement(db, curve, user_id, &achievement.id).await?;
        if was_new {
          newly_unlocked.push(achievement);
        }
      }
    }

    if !newly_unlocked.is_empty() {
      tracing::info!(user_id, count = newly_unlocked.len(), "achievements unlocked");
    }

    Ok(newly_unlocked)
  }

  /// Condition predicate. Missing collaborator rows (no streak document, no
  /// progress singleton) mean "unmet", not an error; so does a `custom`
  /// condition with no registered metric.
  pub async fn check_achievement(
    db: &DatabaseConnection,
    metrics: &MetricRegistry,
    user_id: i64,
    achievement: &AchievementModel,
  ) -> AppResult<bool> {
    let actual = Self::actual_value(db, metrics, user_id, achievement).await?;
    Ok(actual.is_some_and(|actual| actual >= achievement.condition_target))
  }

  /// Percent progress toward an achievement, capped at 100.
  pub async fn get_user_progress(
    db: &DatabaseConnection,
    metrics: &MetricRegistry,
    user_id: i64,
    achievement_id: &str,
  ) -> AppResult<u8> {
    let achievement = CatalogService::get(db, achievement_id).await?;
    let actual = Self::actual_value(db, metrics, user_id, &achievement)
      .await?
      .unwrap_or(0)
      .max(0);

    let pct = (100.0 * actual as f64 / achievement.condition_target as f64).round();
    Ok(pct.min(100.0) as u8)
  }

  /// Atomic unlock. Returns `true` when this call performed the unlock and
  /// `false` when the row was already unlocked (idempotent no-op).
  pub async fn unlock_achievement(
    db: &DatabaseConnection,
    curve: &LevelCurve,
    user_id: i64,
    achievement_id: &str,
  ) -> AppResult<bool> {
    let achievement = CatalogService::get(db, achievement_id).await?;

    // FK targets must exist before the guarded write.
    UserService::get_or_create(db, user_id, None).await?;

    let now = Utc::now().naive_utc();
    let txn = db.begin().await?;

    let existing = UserAchievement::find_by_id((user_id, achievement_id.to_string()))
      .one(&txn)
      .await?;

    match existing {
      Some(row) if row.unlocked_at.is_some() => {
        txn.commit().await?;
        return Ok(false);
      }
      Some(row) => {
        let mut model: UserAchievementActiveModel = row.into();
        model.unlocked_at = Set(Some(now));
        model.progress = Set(100);
        model.claimed = Set(false);
        model.notification_seen = Set(false);
        model.updated_at = Set(now);
        model.update(&txn).await?;
      }
      None => {
        UserAchievementActiveModel {
          user_id: Set(user_id),
          achievement_id: Set(achievement_id.to_string()),
          unlocked_at: Set(Some(now)),
          progress: Set(100),
          claimed: Set(false),
          notification_seen: Set(false),
          updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
      }
    }

    txn.commit().await?;

    // Reward credit, outside the unlock transaction.
    XpService::add_xp(
      db,
      curve,
      user_id,
      achievement.xp_reward,
      XpSource::Achievement,
      Some(achievement.id.clone()),
      format!("Unlocked achievement: {}", achievement.name),
    )
    .await?;

    tracing::info!(user_id, achievement_id, "achievement unlocked");
    Ok(true)
  }

  /// Write a progress percentage without unlocking; no XP is credited.
  pub async fn update_achievement_progress(
    db: &DatabaseConnection,
    user_id: i64,
    achievement_id: &str,
    progress: u8,
  ) -> AppResult<()> {
    CatalogService::get(db, achievement_id).await?;
    UserService::get_or_create(db, user_id, None).await?;

    let progress = progress.min(100) as i32;
    let now = Utc::now().naive_utc();

    match UserAchievement::find_by_id((user_id, achievement_id.to_string())).one(db).await? {
      // An unlocked row is already at 100 and stays there.
      Some(row) if row.unlocked_at.is_some() => {}
      Some(row) => {
        let mut model: UserAchievementActiveModel = row.into();
        model.progress = Set(progress);
        model.updated_at = Set(now);
        model.update(db).await?;
      }
      None => {
        UserAchievementActiveModel {
          user_id: Set(user_id),
          achievement_id: Set(achievement_id.to_string()),
          unlocked_at: Set(None),
          progress: Set(progress),
          claimed: Set(false),
          notification_seen: Set(false),
          updated_at: Set(now),
        }
        .insert(db)
        .await?;
      }
    }
    Ok(())
  }

  /// All achievement-progress rows for a user, for the UI surface.
  pub async fn user_achievements(
    db: &DatabaseConnection,
    user_id: i64,
  ) -> AppResult<Vec<UserAchievementModel>> {
    let rows = UserAchievement::find()
      .filter(user_achievement::Column::UserId.eq(user_id))
      .all(db)
      .await?;
    Ok(rows)
  }

  /// The observable the condition compares against; `None` means the
  /// condition cannot currently be met.
  async fn actual_value(
    db: &DatabaseConnection,
    metrics: &MetricRegistry,
    user_id: i64,
    achievement: &AchievementModel,
  ) -> AppResult<Option<i64>> {
    let actual = match achievement.condition_type {
      ConditionType::CardsCreated => {
        Some(XpService::count_by_source(db, user_id, XpSource::CardCreated).await? as i64)
      }
      ConditionType::ReviewsCompleted => {
        Some(XpService::count_by_source(db, user_id, XpSource::ReviewCompleted).await? as i64)
      }
      ConditionType::DeckCreated => {
        Some(XpService::count_by_source(db, user_id, XpSource::DeckCreated).await? as i64)
      }
      ConditionType::DailyGoal => {
        Some(XpService::count_by_source(db, user_id, XpSource::DailyGoal).await? as i64)
      }
      ConditionType::Streak => {
        StreakService::get(db, user_id).await?.map(|streak| streak.current as i64)
      }
      ConditionType::XpTotal => {
        UserProgress::find_by_id(user_id).one(db).await?.map(|p| p.total_xp)
      }
      ConditionType::LevelReached => {
        UserProgress::find_by_id(user_id).one(db).await?.map(|p| p.level as i64)
      }
      ConditionType::Custom => match &achievement.condition_metric {
        Some(name) => metrics.evaluate(name, db, user_id).await?,
        None => None,
      },
    };
    Ok(actual)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::AppError;
  use crate::services::catalog::AchievementDef;
  use crate::services::testing::{mark_goal_met, setup_test_db};
  use crate::services::StreakService;
  use chrono::NaiveDate;

  fn def(id: &str, condition_type: ConditionType, target: f64) -> AchievementDef {
    AchievementDef {
      id: id.into(),
      name: id.into(),
      description: String::new(),
      tier: Tier::Bronze,
      xp_reward: 50.0,
      icon: String::new(),
      condition_type,
      target,
      metric: None,
      is_active: true,
    }
  }

  #[tokio::test]
  async fn unlock_is_idempotent_and_credits_once() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();
    CatalogService::upsert(&db, &def("cards_5", ConditionType::CardsCreated, 5.0)).await.unwrap();

    let first = AchievementEngine::unlock_achievement(&db, &curve, 1, "cards_5").await.unwrap();
    let second = AchievementEngine::unlock_achievement(&db, &curve, 1, "cards_5").await.unwrap();
    assert!(first);
    assert!(!second);

    // Exactly one reward credit in the ledger.
    let credits = XpService::count_by_source(&db, 1, XpSource::Achievement).await.unwrap();
    assert_eq!(credits, 1);

    let row = UserAchievement::find_by_id((1, "cards_5".to_string()))
      .one(&db)
      .await
      .unwrap()
      .unwrap();
    assert!(row.unlocked_at.is_some());
    assert_eq!(row.progress, 100);
  }

  #[tokio::test]
  async fn unlock_unknown_achievement_is_not_found() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();

    let result = AchievementEngine::unlock_achievement(&db, &curve, 1, "nope").await;
    assert!(matches!(result, Err(AppError::AchievementNotFound)));
  }

  #[tokio::test]
  async fn progress_is_capped_at_100() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();
    let metrics = MetricRegistry::default();
    CatalogService::upsert(&db, &def("cards_10", ConditionType::CardsCreated, 10.0))
      .await
      .unwrap();

    for _ in 0..15 {
      XpService::add_xp(&db, &curve, 1, 5, XpSource::CardCreated, None, "card").await.unwrap();
    }

    let pct = AchievementEngine::get_user_progress(&db, &metrics, 1, "cards_10").await.unwrap();
    assert_eq!(pct, 100);
  }

  #[tokio::test]
  async fn progress_rounds_partial_completion() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();
    let metrics = MetricRegistry::default();
    CatalogService::upsert(&db, &def("cards_3", ConditionType::CardsCreated, 3.0)).await.unwrap();

    XpService::add_xp(&db, &curve, 1, 5, XpSource::CardCreated, None, "card").await.unwrap();

    let pct = AchievementEngine::get_user_progress(&db, &metrics, 1, "cards_3").await.unwrap();
    assert_eq!(pct, 33);
  }

  #[tokio::test]
  async fn type_filter_limits_candidates() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();
    let metrics = MetricRegistry::default();

    CatalogService::upsert(&db, &def("streak_1", ConditionType::Streak, 1.0)).await.unwrap();
    CatalogService::upsert(&db, &def("cards_1", ConditionType::CardsCreated, 1.0)).await.unwrap();

    // Satisfy both conditions.
    XpService::add_xp(&db, &curve, 1, 5, XpSource::CardCreated, None, "card").await.unwrap();
    mark_goal_met(&db, 1, "2025-02-01").await;
    StreakService::update_streak(&db, 1, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap())
      .await
      .unwrap();

    let unlocked = AchievementEngine::check_achievements(
      &db,
      &curve,
      &metrics,
      1,
      Some(&[ConditionType::Streak]),
    )
    .await
    .unwrap();

    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0].id, "streak_1");
  }

  #[tokio::test]
  async fn already_unlocked_is_excluded_from_checks() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();
    let metrics = MetricRegistry::default();
    CatalogService::upsert(&db, &def("cards_1", ConditionType::CardsCreated, 1.0)).await.unwrap();

    XpService::add_xp(&db, &curve, 1, 5, XpSource::CardCreated, None, "card").await.unwrap();

    let first = AchievementEngine::check_achievements(&db, &curve, &metrics, 1, None)
      .await
      .unwrap();
    assert_eq!(first.len(), 1);

    let second = AchievementEngine::check_achievements(&db, &curve, &metrics, 1, None)
      .await
      .unwrap();
    assert!(second.is_empty());

    let credits = XpService::count_by_source(&db, 1, XpSource::Achievement).await.unwrap();
    assert_eq!(credits, 1);
  }

  #[tokio::test]
  async fn missing_streak_row_is_unmet_not_error() {
    let db = setup_test_db().await;
    let metrics = MetricRegistry::default();
    let achievement =
      CatalogService::upsert(&db, &def("streak_3", ConditionType::Streak, 3.0)).await.unwrap();

    let met = AchievementEngine::check_achievement(&db, &metrics, 42, &achievement)
      .await
      .unwrap();
    assert!(!met);
  }

  #[tokio::test]
  async fn custom_condition_without_metric_is_unmet() {
    let db = setup_test_db().await;
    let metrics = MetricRegistry::default();

    let mut custom = def("night_owl", ConditionType::Custom, 10.0);
    custom.metric = Some("night_sessions".into());
    let achievement = CatalogService::upsert(&db, &custom).await.unwrap();

    let met = AchievementEngine::check_achievement(&db, &metrics, 1, &achievement)
      .await
      .unwrap();
    assert!(!met);
  }

  #[tokio::test]
  async fn custom_condition_uses_registered_metric() {
    let db = setup_test_db().await;
    let metrics = MetricRegistry::default();

    struct Fixed(i64);
    #[async_trait::async_trait]
    impl CustomMetric for Fixed {
      async fn evaluate(&self, _db: &DatabaseConnection, _user_id: i64) -> AppResult<i64> {
        Ok(self.0)
      }
    }
    metrics.register("night_sessions", Arc::new(Fixed(12)));

    let mut custom = def("night_owl", ConditionType::Custom, 10.0);
    custom.metric = Some("night_sessions".into());
    let achievement = CatalogService::upsert(&db, &custom).await.unwrap();

    let met = AchievementEngine::check_achievement(&db, &metrics, 1, &achievement)
      .await
      .unwrap();
    assert!(met);
  }

  #[tokio::test]
  async fn progress_update_never_clears_unlock() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();
    CatalogService::upsert(&db, &def("cards_5", ConditionType::CardsCreated, 5.0)).await.unwrap();

    AchievementEngine::update_achievement_progress(&db, 1, "cards_5", 40).await.unwrap();
    AchievementEngine::unlock_achievement(&db, &curve, 1, "cards_5").await.unwrap();
    AchievementEngine::update_achievement_progress(&db, 1, "cards_5", 10).await.unwrap();

    let row = UserAchievement::find_by_id((1, "cards_5".to_string()))
      .one(&db)
      .await
      .unwrap()
      .unwrap();
    assert!(row.unlocked_at.is_some());
    assert_eq!(row.progress, 100);
  }
}
