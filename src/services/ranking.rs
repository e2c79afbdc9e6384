//! Ranking service - periodic leaderboard aggregation
//!
//! Each run folds every user's ledger and daily feed over the period bounds
//! into one entry, orders by XP earned and replaces the `(period, key)`
//! snapshot wholesale. Ranks are dense: users with equal XP share a rank.
//! The read path is best-effort by policy; failures surface as "no ranking"
//! rather than errors.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use sea_orm::{
  ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::prelude::*;
use crate::entities::user_achievement;
use crate::error::{AppError, AppResult};
use crate::services::{ProgressService, StreakService, UserService, XpService};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingEntry {
  pub user_id: i64,
  pub user_name: String,
  pub rank: u32,
  pub cards_reviewed: i64,
  pub xp_earned: i64,
  pub streak_days: i32,
  pub accuracy_rate: f64,
  pub study_time_minutes: i64,
  pub study_sessions: i64,
  pub achievements_unlocked: i64,
  pub last_activity: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct RankingView {
  pub period: Period,
  pub date: String,
  pub entries: Vec<RankingEntry>,
  pub total_participants: i32,
  pub last_updated: NaiveDateTime,
}

pub struct RankingService;

impl RankingService {
  pub async fn update_monthly(db: &DatabaseConnection, key: &str) -> AppResult<RankingView> {
    Self::update_ranking(db, Period::Monthly, key).await
  }

  pub async fn update_yearly(db: &DatabaseConnection, key: &str) -> AppResult<RankingView> {
    Self::update_ranking(db, Period::Yearly, key).await
  }

  /// Rebuild the snapshot for one period from scratch.
  pub async fn update_ranking(
    db: &DatabaseConnection,
    period: Period,
    key: &str,
  ) -> AppResult<RankingView> {
    let (from, to) = Self::period_bounds(period, key)?;

    let mut entries = Vec::new();
    for user_id in UserService::all_ids(db).await? {
      if let Some(entry) = Self::fold_user(db, user_id, from, to).await? {
        entries.push(entry);
      }
    }

    // Highest XP first; equal XP ordered by user id for a stable listing.
    entries.sort_by(|a, b| b.xp_earned.cmp(&a.xp_earned).then(a.user_id.cmp(&b.user_id)));

    // Dense ranks: ties share a rank, the next distinct value takes rank + 1.
    let mut rank = 0;
    let mut last_xp = None;
    for entry in entries.iter_mut() {
      if last_xp != Some(entry.xp_earned) {
        rank += 1;
        last_xp = Some(entry.xp_earned);
      }
      entry.rank = rank;
    }

    let now = Utc::now().naive_utc();
    let total_participants = entries.len() as i32;
    let entries_json = json::to_value(&entries)
      .map_err(|e| AppError::Internal(format!("serialize ranking entries: {e}")))?;

    let model = RankingSnapshotActiveModel {
      period: Set(period),
      date: Set(key.to_string()),
      entries: Set(entries_json),
      total_participants: Set(total_participants),
      last_updated: Set(now),
    };

    // Wholesale replacement of the snapshot.
    match RankingSnapshot::find_by_id((period, key.to_string())).one(db).await? {
      Some(_) => model.update(db).await?,
      None => model.insert(db).await?,
    };

    tracing::info!(?period, key, total_participants, "ranking snapshot rebuilt");

    Ok(RankingView { period, date: key.to_string(), entries, total_participants, last_updated: now })
  }

  pub async fn get_ranking(
    db: &DatabaseConnection,
    period: Period,
    key: &str,
  ) -> AppResult<Option<RankingView>> {
    let Some(snapshot) = RankingSnapshot::find_by_id((period, key.to_string())).one(db).await?
    else {
      return Ok(None);
    };

    let entries: Vec<RankingEntry> = json::from_value(snapshot.entries)
      .map_err(|e| AppError::Internal(format!("deserialize ranking entries: {e}")))?;

    Ok(Some(RankingView {
      period,
      date: snapshot.date,
      entries,
      total_participants: snapshot.total_participants,
      last_updated: snapshot.last_updated,
    }))
  }

  /// Rank of one user in a stored snapshot. Best-effort: a missing snapshot,
  /// a missing entry or any read failure all come back as `None`.
  pub async fn user_rank_position(
    db: &DatabaseConnection,
    user_id: i64,
    period: Period,
    key: &str,
  ) -> Option<u32> {
    match Self::get_ranking(db, period, key).await {
      Ok(Some(view)) => {
        view.entries.iter().find(|entry| entry.user_id == user_id).map(|entry| entry.rank)
      }
      Ok(None) => None,
      Err(err) => {
        tracing::warn!(user_id, ?period, key, "rank lookup failed: {err}");
        None
      }
    }
  }

  /// `[from, to)` datetime bounds for a period key: `YYYY-MM` for monthly,
  /// `YYYY` for yearly.
  fn period_bounds(period: Period, key: &str) -> AppResult<(NaiveDateTime, NaiveDateTime)> {
    let bad_key = || AppError::Invalid(format!("bad period key: {key}"));

    let (from, to) = match period {
      Period::Monthly => {
        let from = NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d")
          .map_err(|_| bad_key())?;
        let to = if from.month() == 12 {
          NaiveDate::from_ymd_opt(from.year() + 1, 1, 1)
        } else {
          NaiveDate::from_ymd_opt(from.year(), from.month() + 1, 1)
        }
        .ok_or_else(bad_key)?;
        (from, to)
      }
      Period::Yearly => {
        let year: i32 = key.parse().map_err(|_| bad_key())?;
        let from = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(bad_key)?;
        let to = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(bad_key)?;
        (from, to)
      }
    };

    Ok((
      from.and_hms_opt(0, 0, 0).expect("midnight is valid"),
      to.and_hms_opt(0, 0, 0).expect("midnight is valid"),
    ))
  }

  /// One user's entry for the period, or `None` when they had no activity.
  async fn fold_user(
    db: &DatabaseConnection,
    user_id: i64,
    from: NaiveDateTime,
    to: NaiveDateTime,
  ) -> AppResult<Option<RankingEntry>> {
    let xp_earned: i64 = XpService::transactions_between(db, user_id, from, to)
      .await?
      .iter()
      .map(|t| t.amount)
      .sum();

    let from_key = from.date().format("%Y-%m-%d").to_string();
    let to_key = (to.date() - chrono::TimeDelta::days(1)).format("%Y-%m-%d").to_string();
    let days = ProgressService::daily_between(db, user_id, &from_key, &to_key).await?;

    let cards_reviewed: i64 = days.iter().map(|d| d.cards_reviewed as i64).sum();
    let cards_correct: i64 = days.iter().map(|d| d.cards_correct as i64).sum();
    let study_time_minutes: i64 = days.iter().map(|d| d.study_time_minutes as i64).sum();
    let study_sessions: i64 = days.iter().map(|d| d.study_sessions as i64).sum();

    if xp_earned == 0 && cards_reviewed == 0 {
      return Ok(None);
    }

    let accuracy_rate = if cards_reviewed > 0 {
      100.0 * cards_correct as f64 / cards_reviewed as f64
    } else {
      0.0
    };

    let streak_days = StreakService::get(db, user_id).await?.map_or(0, |s| s.current);

    let achievements_unlocked = UserAchievement::find()
      .filter(user_achievement::Column::UserId.eq(user_id))
      .filter(user_achievement::Column::UnlockedAt.gte(from))
      .filter(user_achievement::Column::UnlockedAt.lt(to))
      .all(db)
      .await?
      .len() as i64;

    let user = UserService::get_by_id(db, user_id).await?;
    let user_name = user.and_then(|u| u.username).unwrap_or_else(|| format!("user-{user_id}"));
    let last_activity = UserProgress::find_by_id(user_id)
      .one(db)
      .await?
      .map(|p| p.last_activity);

    Ok(Some(RankingEntry {
      user_id,
      user_name,
      rank: 0,
      cards_reviewed,
      xp_earned,
      streak_days,
      accuracy_rate,
      study_time_minutes,
      study_sessions,
      achievements_unlocked,
      last_activity,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::testing::setup_test_db;
  use crate::services::xp::LevelCurve;

  async fn grant(db: &DatabaseConnection, user_id: i64, amount: i64) {
    let curve = LevelCurve::default();
    XpService::add_xp(db, &curve, user_id, amount, XpSource::ReviewCompleted, None, "review")
      .await
      .unwrap();
  }

  fn this_month() -> String {
    Utc::now().format("%Y-%m").to_string()
  }

  #[test]
  fn monthly_bounds_cover_the_whole_month() {
    let (from, to) = RankingService::period_bounds(Period::Monthly, "2025-03").unwrap();
    assert_eq!(from.date(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    assert_eq!(to.date(), NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());

    // December rolls the upper bound into the next year.
    let (from, to) = RankingService::period_bounds(Period::Monthly, "2025-12").unwrap();
    assert_eq!(from.date(), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
    assert_eq!(to.date(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
  }

  #[tokio::test]
  async fn dense_ranks_share_on_ties() {
    let db = setup_test_db().await;
    grant(&db, 1, 1000).await;
    grant(&db, 2, 800).await;
    grant(&db, 3, 800).await;

    let view = RankingService::update_monthly(&db, &this_month()).await.unwrap();

    assert_eq!(view.total_participants, 3);
    let ranks: Vec<(i64, u32)> =
      view.entries.iter().map(|e| (e.user_id, e.rank)).collect();
    assert_eq!(ranks, vec![(1, 1), (2, 2), (3, 2)]);
  }

  #[tokio::test]
  async fn snapshot_is_replaced_wholesale() {
    let db = setup_test_db().await;
    let key = this_month();

    grant(&db, 1, 100).await;
    let view = RankingService::update_monthly(&db, &key).await.unwrap();
    assert_eq!(view.total_participants, 1);

    grant(&db, 2, 500).await;
    let view = RankingService::update_monthly(&db, &key).await.unwrap();
    assert_eq!(view.total_participants, 2);
    assert_eq!(view.entries[0].user_id, 2);

    let stored = RankingService::get_ranking(&db, Period::Monthly, &key).await.unwrap().unwrap();
    assert_eq!(stored.entries.len(), 2);
  }

  #[tokio::test]
  async fn rank_position_is_best_effort() {
    let db = setup_test_db().await;
    let key = this_month();

    // No snapshot at all.
    assert_eq!(RankingService::user_rank_position(&db, 1, Period::Monthly, &key).await, None);

    grant(&db, 1, 100).await;
    RankingService::update_monthly(&db, &key).await.unwrap();

    assert_eq!(RankingService::user_rank_position(&db, 1, Period::Monthly, &key).await, Some(1));
    // User absent from the snapshot.
    assert_eq!(RankingService::user_rank_position(&db, 9, Period::Monthly, &key).await, None);
  }

  #[tokio::test]
  async fn bad_period_keys_rejected() {
    let db = setup_test_db().await;

    let result = RankingService::update_monthly(&db, "not-a-month").await;
    assert!(matches!(result, Err(AppError::Invalid(_))));

    let result = RankingService::update_yearly(&db, "20x5").await;
    assert!(matches!(result, Err(AppError::Invalid(_))));
  }

  #[tokio::test]
  async fn out_of_period_activity_is_excluded() {
    let db = setup_test_db().await;

    grant(&db, 1, 100).await;
    // A month with no activity yields an empty snapshot.
    let view = RankingService::update_monthly(&db, "2001-01").await.unwrap();
    assert_eq!(view.total_participants, 0);
    assert!(view.entries.is_empty());
  }
}
