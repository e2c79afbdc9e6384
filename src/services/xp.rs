//! XP ledger service - immutable transaction log and level arithmetic
//!
//! Every XP grant appends a ledger row first, then folds the amount into the
//! user's cumulative progress. Activity counts for count-based achievement
//! conditions are answered by counting ledger rows per `(user, source)`
//! rather than keeping denormalized counters, which rules out counter drift
//! at the cost of a count query per check.

use chrono::Utc;
use sea_orm::{
  ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::prelude::*;
use crate::entities::xp_transaction;
use crate::error::{AppError, AppResult};
use crate::services::ProgressService;

/// Monotonic step function from cumulative XP to level.
///
/// `thresholds[i]` is the total XP required to reach level `i + 2`; level 1
/// needs nothing. The table is configuration, not a per-call formula.
#[derive(Debug, Clone)]
pub struct LevelCurve {
  thresholds: Vec<i64>,
}

impl LevelCurve {
  pub fn new(thresholds: Vec<i64>) -> Self {
    debug_assert!(thresholds.windows(2).all(|w| w[0] <= w[1]));
    Self { thresholds }
  }

  pub fn level_for(&self, total_xp: i64) -> i32 {
    let reached = self.thresholds.iter().take_while(|&&t| total_xp >= t).count();
    1 + reached as i32
  }

  /// Total XP at which `level` begins (0 for level 1).
  pub fn floor_xp(&self, level: i32) -> i64 {
    if level <= 1 {
      return 0;
    }
    self
      .thresholds
      .get(level as usize - 2)
      .copied()
      .unwrap_or_else(|| *self.thresholds.last().unwrap_or(&0))
  }

  pub fn max_level(&self) -> i32 {
    1 + self.thresholds.len() as i32
  }
}

impl Default for LevelCurve {
  /// Quadratic table: reaching level `n` takes `50 * (n - 1) * n` total XP
  /// (100 XP to level 2, 300 to level 3, ...), capped at level 100.
  fn default() -> Self {
    let thresholds = (2..=100i64).map(|n| 50 * (n - 1) * n).collect();
    Self { thresholds }
  }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LevelUpInfo {
  pub leveled_up: bool,
  pub old_level: i32,
  pub new_level: i32,
  pub levels_gained: i32,
}

/// Result of an XP grant: the updated progress and what happened to the level.
#[derive(Debug, Serialize)]
pub struct XpAward {
  pub transaction_id: Uuid,
  pub progress: UserProgressModel,
  pub level_up: LevelUpInfo,
}

pub struct XpService;

impl XpService {
  /// Append a ledger transaction and fold it into the user's progress.
  ///
  /// `total_xp` only ever grows and `level` never decreases, regardless of
  /// what the curve says for the new total.
  pub async fn add_xp(
    db: &DatabaseConnection,
    curve: &LevelCurve,
    user_id: i64,
    amount: i64,
    source: XpSource,
    source_id: Option<String>,
    description: impl Into<String>,
  ) -> AppResult<XpAward> {
    if amount < 0 {
      return Err(AppError::Invalid(format!("negative XP amount: {amount}")));
    }

    let now = Utc::now().naive_utc();
    let transaction_id = Uuid::new_v4();

    // Ensures the user and progress rows exist before the ledger append.
    let progress = ProgressService::get_or_create(db, user_id).await?;

    let transaction = XpTransactionActiveModel {
      id: Set(transaction_id),
      user_id: Set(user_id),
      amount: Set(amount),
      source: Set(source),
      source_id: Set(source_id),
      description: Set(description.into()),
      created_at: Set(now),
    };
    transaction.insert(db).await?;
    let old_level = progress.level;
    let new_total = progress.total_xp + amount;

    // Level can only go up from here, even if the curve table shrinks.
    let new_level = curve.level_for(new_total).max(old_level);
    let current_xp = new_total - curve.floor_xp(new_level);

    let mut model: UserProgressActiveModel = progress.into();
    model.total_xp = Set(new_total);
    model.current_xp = Set(current_xp);
    model.level = Set(new_level);
    model.last_activity = Set(now);
    let progress = model.update(db).await?;

    let level_up = LevelUpInfo {
      leveled_up: new_level > old_level,
      old_level,
      new_level,
      levels_gained: new_level - old_level,
    };

    if level_up.leveled_up {
      tracing::info!(user_id, old_level, new_level, "user leveled up");
    }

    Ok(XpAward { transaction_id, progress, level_up })
  }

  /// Cardinality oracle for count-based achievement conditions.
  pub async fn count_by_source(
    db: &DatabaseConnection,
    user_id: i64,
    source: XpSource,
  ) -> AppResult<u64> {
    let count = XpTransaction::find()
      .filter(xp_transaction::Column::UserId.eq(user_id))
      .filter(xp_transaction::Column::Source.eq(source))
      .count(db)
      .await?;
    Ok(count)
  }

  /// All of a user's transactions inside `[from, to)`, oldest first.
  pub async fn transactions_between(
    db: &DatabaseConnection,
    user_id: i64,
    from: chrono::NaiveDateTime,
    to: chrono::NaiveDateTime,
  ) -> AppResult<Vec<XpTransactionModel>> {
    use sea_orm::QueryOrder;

    let transactions = XpTransaction::find()
      .filter(xp_transaction::Column::UserId.eq(user_id))
      .filter(xp_transaction::Column::CreatedAt.gte(from))
      .filter(xp_transaction::Column::CreatedAt.lt(to))
      .order_by_asc(xp_transaction::Column::CreatedAt)
      .all(db)
      .await?;
    Ok(transactions)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::testing::setup_test_db;

  #[test]
  fn level_curve_is_monotonic_steps() {
    let curve = LevelCurve::default();

    assert_eq!(curve.level_for(0), 1);
    assert_eq!(curve.level_for(99), 1);
    assert_eq!(curve.level_for(100), 2);
    assert_eq!(curve.level_for(299), 2);
    assert_eq!(curve.level_for(300), 3);

    let mut last = 0;
    for xp in (0..20_000).step_by(37) {
      let level = curve.level_for(xp);
      assert!(level >= last);
      last = level;
    }
  }

  #[test]
  fn level_curve_floor_is_inverse() {
    let curve = LevelCurve::new(vec![100, 300, 600]);
    assert_eq!(curve.floor_xp(1), 0);
    assert_eq!(curve.floor_xp(2), 100);
    assert_eq!(curve.floor_xp(4), 600);
    assert_eq!(curve.max_level(), 4);
  }

  #[tokio::test]
  async fn add_xp_appends_ledger_and_levels_up() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();

    let award =
      XpService::add_xp(&db, &curve, 1, 150, XpSource::ReviewCompleted, None, "review batch")
        .await
        .unwrap();

    assert!(award.level_up.leveled_up);
    assert_eq!(award.level_up.old_level, 1);
    assert_eq!(award.level_up.new_level, 2);
    assert_eq!(award.progress.total_xp, 150);
    assert_eq!(award.progress.current_xp, 50);

    let count = XpService::count_by_source(&db, 1, XpSource::ReviewCompleted).await.unwrap();
    assert_eq!(count, 1);
  }

  #[tokio::test]
  async fn level_never_decreases() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();

    let mut last_level = 0;
    for amount in [0, 40, 500, 0, 3, 1_000, 0] {
      let award =
        XpService::add_xp(&db, &curve, 7, amount, XpSource::CardCreated, None, "cards")
          .await
          .unwrap();
      assert!(award.progress.level >= last_level);
      last_level = award.progress.level;
    }
  }

  #[tokio::test]
  async fn negative_amounts_rejected() {
    let db = setup_test_db().await;
    let curve = LevelCurve::default();

    let result =
      XpService::add_xp(&db, &curve, 1, -5, XpSource::ReviewCompleted, None, "bad").await;
    assert!(matches!(result, Err(AppError::Invalid(_))));
  }
}
