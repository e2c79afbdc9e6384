//! Progress service - per-user cumulative progress and the daily feed
//!
//! Owns the `user_progress` singleton and the per-day `daily_progress` rows,
//! and hosts the register-study-session entry point that chains the feed
//! update, XP crediting, streak recompute and achievement check together.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
  ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::prelude::*;
use crate::entities::{daily_progress, user_achievement};
use crate::error::{AppError, AppResult};
use crate::services::achievement::{AchievementEngine, MetricRegistry};
use crate::services::xp::{LevelCurve, LevelUpInfo, XpService};
use crate::services::{StreakService, UserService};

/// Activity thresholds and XP amounts. Configuration, not policy baked into
/// call sites.
#[derive(Debug, Clone)]
pub struct SessionRules {
  /// Cards reviewed in a day for the daily goal to count as met.
  pub daily_goal_cards: i32,
  pub xp_per_session: i64,
  pub xp_daily_goal_bonus: i64,
  pub xp_per_card_created: i64,
  pub xp_per_deck_created: i64,
}

impl Default for SessionRules {
  fn default() -> Self {
    Self {
      daily_goal_cards: 20,
      xp_per_session: 25,
      xp_daily_goal_bonus: 50,
      xp_per_card_created: 5,
      xp_per_deck_created: 20,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct StudySession {
  pub date: NaiveDate,
  pub cards_reviewed: i32,
  pub cards_correct: i32,
  pub study_time_minutes: i32,
}

#[derive(Debug, Serialize)]
pub struct SessionOutcome {
  pub progress: UserProgressModel,
  pub streak: StreakModel,
  pub level_up: LevelUpInfo,
  pub goal_met: bool,
  pub unlocked: Vec<AchievementModel>,
}

pub struct ProgressService;

impl ProgressService {
  /// Get or create the per-user progress singleton
  pub async fn get_or_create(db: &DatabaseConnection, user_id: i64) -> AppResult<UserProgressModel> {
    if let Some(progress) = UserProgress::find_by_id(user_id).one(db).await? {
      return Ok(progress);
    }

    // Ensure user exists first
    UserService::get_or_create(db, user_id, None).await?;

    let now = Utc::now().naive_utc();
    let progress = UserProgressActiveModel {
      user_id: Set(user_id),
      level: Set(1),
      current_xp: Set(0),
      total_xp: Set(0),
      current_streak: Set(0),
      longest_streak: Set(0),
      total_cards_reviewed: Set(0),
      last_activity: Set(now),
      created_at: Set(now),
    };

    let progress = progress.insert(db).await?;
    Ok(progress)
  }

  pub async fn get(db: &DatabaseConnection, user_id: i64) -> AppResult<UserProgressModel> {
    UserProgress::find_by_id(user_id)
      .one(db)
      .await?
      .ok_or(AppError::UserNotFound)
  }

  pub async fn daily(
    db: &DatabaseConnection,
    user_id: i64,
    date: &str,
  ) -> AppResult<Option<DailyProgressModel>> {
    let row = DailyProgress::find_by_id((user_id, date.to_string())).one(db).await?;
    Ok(row)
  }

  /// Daily rows inside `[from, to]`, ascending by date key.
  pub async fn daily_between(
    db: &DatabaseConnection,
    user_id: i64,
    from: &str,
    to: &str,
  ) -> AppResult<Vec<DailyProgressModel>> {
    let rows = DailyProgress::find()
      .filter(daily_progress::Column::UserId.eq(user_id))
      .filter(daily_progress::Column::Date.gte(from))
      .filter(daily_progress::Column::Date.lte(to))
      .order_by_asc(daily_progress::Column::Date)
      .all(db)
      .await?;
    Ok(rows)
  }

  /// Register a completed study session.
  ///
  /// Folds the session into the day's feed row, credits session XP (plus the
  /// one-time daily-goal bonus on the day the goal flips to met), recomputes
  /// the streak and runs the achievement check. Newly unlocked achievements
  /// come back in catalog order.
  pub async fn record_session(
    db: &DatabaseConnection,
    curve: &LevelCurve,
    rules: &SessionRules,
    metrics: &MetricRegistry,
    user_id: i64,
    session: &StudySession,
  ) -> AppResult<SessionOutcome> {
    if session.cards_reviewed < 0
      || session.cards_correct < 0
      || session.cards_correct > session.cards_reviewed
      || session.study_time_minutes < 0
    {
      return Err(AppError::Invalid("malformed study session".into()));
    }

    let initial = Self::get_or_create(db, user_id).await?;
    let date = session.date.format("%Y-%m-%d").to_string();
    let now = Utc::now().naive_utc();

    // Fold into the day's feed row.
    let existing = DailyProgress::find_by_id((user_id, date.clone())).one(db).await?;
    let was_met = existing.as_ref().is_some_and(|d| d.goal_met);
    let cards_today =
      existing.as_ref().map_or(0, |d| d.cards_reviewed) + session.cards_reviewed;
    let goal_met = was_met || cards_today >= rules.daily_goal_cards;

    match existing {
      Some(day) => {
        let mut model: DailyProgressActiveModel = day.clone().into();
        model.cards_reviewed = Set(cards_today);
        model.cards_correct = Set(day.cards_correct + session.cards_correct);
        model.goal_met = Set(goal_met);
        model.study_time_minutes = Set(day.study_time_minutes + session.study_time_minutes);
        model.study_sessions = Set(day.study_sessions + 1);
        model.updated_at = Set(now);
        model.update(db).await?;
      }
      None => {
        DailyProgressActiveModel {
          user_id: Set(user_id),
          date: Set(date.clone()),
          cards_reviewed: Set(cards_today),
          cards_correct: Set(session.cards_correct),
          goal_met: Set(goal_met),
          xp_earned: Set(0),
          study_time_minutes: Set(session.study_time_minutes),
          study_sessions: Set(1),
          updated_at: Set(now),
        }
        .insert(db)
        .await?;
      }
    }

    // Session XP, plus the bonus exactly once per day on the met transition.
    let mut xp_earned = 0;
    XpService::add_xp(
      db,
      curve,
      user_id,
      rules.xp_per_session,
      XpSource::ReviewCompleted,
      None,
      "Completed study session",
    )
    .await?;
    xp_earned += rules.xp_per_session;

    if goal_met && !was_met {
      XpService::add_xp(
        db,
        curve,
        user_id,
        rules.xp_daily_goal_bonus,
        XpSource::DailyGoal,
        Some(date.clone()),
        "Daily goal met",
      )
      .await?;
      xp_earned += rules.xp_daily_goal_bonus;
    }

    DailyProgress::update_many()
      .col_expr(
        daily_progress::Column::XpEarned,
        Expr::col(daily_progress::Column::XpEarned).add(xp_earned),
      )
      .filter(daily_progress::Column::UserId.eq(user_id))
      .filter(daily_progress::Column::Date.eq(date))
      .exec(db)
      .await?;

    // Cumulative review counter on the singleton.
    let progress = Self::get(db, user_id).await?;
    let mut model: UserProgressActiveModel = progress.clone().into();
    model.total_cards_reviewed =
      Set(progress.total_cards_reviewed + session.cards_reviewed as i64);
    model.update(db).await?;

    let streak = StreakService::update_streak(db, user_id, session.date).await?;
    let unlocked = AchievementEngine::check_achievements(db, curve, metrics, user_id, None).await?;

    let progress = Self::get(db, user_id).await?;
    let level_up = LevelUpInfo {
      leveled_up: progress.level > initial.level,
      old_level: initial.level,
      new_level: progress.level,
      levels_gained: progress.level - initial.level,
    };
    Ok(SessionOutcome { progress, streak, level_up, goal_met, unlocked })
  }

  /// Card/deck creation feed: one ledger row per created item.
  pub async fn record_card_created(
    db: &DatabaseConnection,
    curve: &LevelCurve,
    rules: &SessionRules,
    user_id: i64,
    card_id: &str,
  ) -> AppResult<()> {
    XpService::add_xp(
      db,
      curve,
      user_id,
      rules.xp_per_card_created,
      XpSource::CardCreated,
      Some(card_id.to_string()),
      "Created a card",
    )
    .await?;
    Ok(())
  }

  pub async fn record_deck_created(
    db: &DatabaseConnection,
    curve: &LevelCurve,
    rules: &SessionRules,
    user_id: i64,
    deck_id: &str,
  ) -> AppResult<()> {
    XpService::add_xp(
      db,
      curve,
      user_id,
      rules.xp_per_deck_created,
      XpSource::DeckCreated,
      Some(deck_id.to_string()),
      "Created a deck",
    )
    .await?;
    Ok(())
  }

  /// Mark every unlocked achievement notification seen in one statement.
  pub async fn mark_notifications_seen(db: &DatabaseConnection, user_id: i64) -> AppResult<u64> {
    let result = UserAchievement::update_many()
      .col_expr(user_achievement::Column::NotificationSeen, Expr::value(true))
      .filter(user_achievement::Column::UserId.eq(user_id))
      .filter(user_achievement::Column::UnlockedAt.is_not_null())
      .exec(db)
      .await?;
    Ok(result.rows_affected)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::testing::setup_test_db;

  #[tokio::test]
  async fn session_folds_into_daily_row() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();
    let rules = SessionRules::default();
    let metrics = MetricRegistry::default();

    let session = StudySession {
      date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
      cards_reviewed: 12,
      cards_correct: 10,
      study_time_minutes: 15,
    };
    let outcome =
      ProgressService::record_session(&db, &curve, &rules, &metrics, 1, &session).await.unwrap();
    assert!(!outcome.goal_met);

    let outcome =
      ProgressService::record_session(&db, &curve, &rules, &metrics, 1, &session).await.unwrap();
    assert!(outcome.goal_met);
    assert_eq!(outcome.streak.current, 1);
    assert_eq!(outcome.progress.total_cards_reviewed, 24);

    let day = ProgressService::daily(&db, 1, "2025-03-01").await.unwrap().unwrap();
    assert_eq!(day.cards_reviewed, 24);
    assert_eq!(day.study_sessions, 2);
    assert!(day.goal_met);
    // Two sessions plus one goal bonus.
    assert_eq!(day.xp_earned, 2 * rules.xp_per_session + rules.xp_daily_goal_bonus);
  }

  #[tokio::test]
  async fn daily_goal_bonus_awarded_once() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();
    let rules = SessionRules::default();
    let metrics = MetricRegistry::default();

    let session = StudySession {
      date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
      cards_reviewed: 30,
      cards_correct: 25,
      study_time_minutes: 20,
    };
    for _ in 0..3 {
      ProgressService::record_session(&db, &curve, &rules, &metrics, 1, &session).await.unwrap();
    }

    let bonuses = XpService::count_by_source(&db, 1, XpSource::DailyGoal).await.unwrap();
    assert_eq!(bonuses, 1);
  }

  #[tokio::test]
  async fn malformed_sessions_rejected() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();
    let rules = SessionRules::default();
    let metrics = MetricRegistry::default();

    let session = StudySession {
      date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
      cards_reviewed: 5,
      cards_correct: 9,
      study_time_minutes: 10,
    };
    let result =
      ProgressService::record_session(&db, &curve, &rules, &metrics, 1, &session).await;
    assert!(matches!(result, Err(AppError::Invalid(_))));
  }
}
