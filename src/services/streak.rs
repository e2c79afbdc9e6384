//! Streak service - consecutive-day continuity tracking
//!
//! A streak is the number of consecutive calendar days the user met their
//! daily goal. The goal-based backward walk below is the single canonical
//! definition of "current streak": live updates and repair recomputation both
//! run it against the goal-met days, so the two paths cannot drift apart.

use chrono::{NaiveDate, TimeDelta, Utc};
use sea_orm::{
  ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::{HashMap, HashSet};

use crate::entities::prelude::*;
use crate::entities::{daily_progress, streak_day};
use crate::error::AppResult;
use crate::services::ProgressService;

pub struct StreakService;

impl StreakService {
  /// Walk backward from today (or yesterday, if today's goal is still open)
  /// counting consecutive goal-met days.
  ///
  /// A goal not yet met today does not break the run until the grace day
  /// fully lapses: the walk then starts from yesterday instead, so the most
  /// recent completed streak is preserved "at risk" for one day.
  pub fn compute_current(goal_days: &HashSet<NaiveDate>, today: NaiveDate) -> i32 {
    let yesterday = today - TimeDelta::days(1);

    let start = if goal_days.contains(&today) {
      today
    } else if goal_days.contains(&yesterday) {
      yesterday
    } else {
      return 0;
    };

    let mut current = 1;
    let mut day = start;
    while goal_days.contains(&(day - TimeDelta::days(1))) {
      current += 1;
      day -= TimeDelta::days(1);
    }
    current
  }

  /// Collapse raw history entries to at most one per date, keeping the
  /// higher count for a date, sorted ascending by date string.
  pub fn dedup_history(entries: &[(String, i32)]) -> Vec<(String, i32)> {
    let mut by_date: HashMap<&str, i32> = HashMap::new();
    for (date, count) in entries {
      let slot = by_date.entry(date).or_insert(*count);
      *slot = (*slot).max(*count);
    }

    let mut merged: Vec<(String, i32)> =
      by_date.into_iter().map(|(date, count)| (date.to_string(), count)).collect();
    merged.sort_by(|a, b| a.0.cmp(&b.0));
    merged
  }

  pub async fn get(db: &DatabaseConnection, user_id: i64) -> AppResult<Option<StreakModel>> {
    let streak = Streak::find_by_id(user_id).one(db).await?;
    Ok(streak)
  }

  pub async fn history(db: &DatabaseConnection, user_id: i64) -> AppResult<Vec<StreakDayModel>> {
    let days = StreakDay::find()
      .filter(streak_day::Column::UserId.eq(user_id))
      .order_by_asc(streak_day::Column::Date)
      .all(db)
      .await?;
    Ok(days)
  }

  /// Recompute the streak from the daily goal-met feed and persist it.
  ///
  /// `longest` is monotone: it only ever ratchets up, even when `current`
  /// resets to zero. The result is mirrored into the user's progress row.
  pub async fn update_streak(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
  ) -> AppResult<StreakModel> {
    let goal_days = Self::goal_met_days(db, user_id).await?;
    let current = Self::compute_current(&goal_days, today);
    let now = Utc::now().naive_utc();

    let streak = match Streak::find_by_id(user_id).one(db).await? {
      Some(existing) => {
        let longest = existing.longest.max(current);
        let mut model: StreakActiveModel = existing.into();
        model.current = Set(current);
        model.longest = Set(longest);
        model.last_update = Set(now);
        model.update(db).await?
      }
      None => {
        StreakActiveModel {
          user_id: Set(user_id),
          current: Set(current),
          longest: Set(current),
          last_update: Set(now),
        }
        .insert(db)
        .await?
      }
    };

    if goal_days.contains(&today) {
      Self::record_day(db, user_id, &today.format("%Y-%m-%d").to_string(), current).await?;
    }

    Self::mirror_to_progress(db, user_id, &streak).await?;

    Ok(streak)
  }

  /// Repair entry point: dedup the stored history, then rerun the canonical
  /// backward walk. Returns the cleaned history.
  pub async fn recalculate(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
  ) -> AppResult<Vec<StreakDayModel>> {
    let raw: Vec<(String, i32)> = Self::history(db, user_id)
      .await?
      .into_iter()
      .map(|d| (d.date, d.count))
      .collect();
    let merged = Self::dedup_history(&raw);

    StreakDay::delete_many()
      .filter(streak_day::Column::UserId.eq(user_id))
      .exec(db)
      .await?;
    for (date, count) in &merged {
      StreakDayActiveModel {
        user_id: Set(user_id),
        date: Set(date.clone()),
        count: Set(*count),
      }
      .insert(db)
      .await?;
    }

    Self::update_streak(db, user_id, today).await?;
    Self::history(db, user_id).await
  }

  /// Merge one dated entry into the history, higher count wins per date.
  pub async fn record_day(
    db: &DatabaseConnection,
    user_id: i64,
    date: &str,
    count: i32,
  ) -> AppResult<()> {
    match StreakDay::find_by_id((user_id, date.to_string())).one(db).await? {
      Some(existing) if existing.count >= count => {}
      Some(existing) => {
        let mut model: StreakDayActiveModel = existing.into();
        model.count = Set(count);
        model.update(db).await?;
      }
      None => {
        StreakDayActiveModel {
          user_id: Set(user_id),
          date: Set(date.to_string()),
          count: Set(count),
        }
        .insert(db)
        .await?;
      }
    }
    Ok(())
  }

  async fn goal_met_days(db: &DatabaseConnection, user_id: i64) -> AppResult<HashSet<NaiveDate>> {
    let rows = DailyProgress::find()
      .filter(daily_progress::Column::UserId.eq(user_id))
      .filter(daily_progress::Column::GoalMet.eq(true))
      .all(db)
      .await?;

    Ok(
      rows
        .iter()
        .filter_map(|row| NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").ok())
        .collect(),
    )
  }

  async fn mirror_to_progress(
    db: &DatabaseConnection,
    user_id: i64,
    streak: &StreakModel,
  ) -> AppResult<()> {
    let progress = ProgressService::get_or_create(db, user_id).await?;
    let mut model: UserProgressActiveModel = progress.into();
    model.current_streak = Set(streak.current);
    model.longest_streak = Set(streak.longest);
    model.update(db).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::testing::{mark_goal_met, setup_test_db};

  fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  fn days(dates: &[&str]) -> HashSet<NaiveDate> {
    dates.iter().map(|d| date(d)).collect()
  }

  #[test]
  fn walk_counts_consecutive_days_through_today() {
    let goal = days(&["2025-01-08", "2025-01-09", "2025-01-10"]);
    assert_eq!(StreakService::compute_current(&goal, date("2025-01-10")), 3);
  }

  #[test]
  fn open_today_keeps_streak_at_risk() {
    let goal = days(&["2025-01-08", "2025-01-09"]);
    // Today not met yet, yesterday was: the completed streak survives.
    assert_eq!(StreakService::compute_current(&goal, date("2025-01-10")), 2);
  }

  #[test]
  fn lapsed_grace_day_resets_to_zero() {
    let goal = days(&["2025-01-07", "2025-01-08"]);
    assert_eq!(StreakService::compute_current(&goal, date("2025-01-10")), 0);
  }

  #[test]
  fn gap_breaks_the_walk() {
    let goal = days(&["2025-01-06", "2025-01-08", "2025-01-09", "2025-01-10"]);
    assert_eq!(StreakService::compute_current(&goal, date("2025-01-10")), 3);
  }

  #[test]
  fn dedup_keeps_higher_count_per_date() {
    let raw = vec![
      ("2025-01-01".to_string(), 3),
      ("2025-01-01".to_string(), 5),
      ("2025-01-02".to_string(), 2),
    ];
    let merged = StreakService::dedup_history(&raw);
    assert_eq!(merged, vec![("2025-01-01".to_string(), 5), ("2025-01-02".to_string(), 2)]);
  }

  #[tokio::test]
  async fn longest_is_monotone_across_resets() {
    let db = setup_test_db().await;

    mark_goal_met(&db, 1, "2025-01-01").await;
    mark_goal_met(&db, 1, "2025-01-02").await;
    mark_goal_met(&db, 1, "2025-01-03").await;

    let streak = StreakService::update_streak(&db, 1, date("2025-01-03")).await.unwrap();
    assert_eq!(streak.current, 3);
    assert_eq!(streak.longest, 3);

    // Well past the grace day: current resets, longest stays.
    let streak = StreakService::update_streak(&db, 1, date("2025-01-10")).await.unwrap();
    assert_eq!(streak.current, 0);
    assert_eq!(streak.longest, 3);

    mark_goal_met(&db, 1, "2025-01-10").await;
    let streak = StreakService::update_streak(&db, 1, date("2025-01-10")).await.unwrap();
    assert_eq!(streak.current, 1);
    assert_eq!(streak.longest, 3);
  }

  #[tokio::test]
  async fn recalculate_reruns_canonical_walk() {
    let db = setup_test_db().await;

    mark_goal_met(&db, 1, "2025-01-09").await;
    mark_goal_met(&db, 1, "2025-01-10").await;
    StreakService::record_day(&db, 1, "2025-01-09", 1).await.unwrap();
    StreakService::record_day(&db, 1, "2025-01-10", 9).await.unwrap();

    let history = StreakService::recalculate(&db, 1, date("2025-01-10")).await.unwrap();
    assert_eq!(history.len(), 2);

    // Current comes from the walk over goal-met days, not from the last
    // history entry's count.
    let streak = StreakService::get(&db, 1).await.unwrap().unwrap();
    assert_eq!(streak.current, 2);
  }
}
