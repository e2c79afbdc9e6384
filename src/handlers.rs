//! HTTP surface - thin axum handlers over the services

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::entities::prelude::*;
use crate::prelude::*;
use crate::services::progress::{SessionOutcome, StudySession};
use crate::services::ranking::RankingView;
use crate::services::{
  AchievementEngine, ProgressService, RankingService, StreakService, UserService,
};
use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
  pub status: &'static str,
  pub version: &'static str,
}

pub async fn health() -> Json<Health> {
  Json(Health { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

pub async fn record_session(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  Json(session): Json<StudySession>,
) -> AppResult<Json<SessionOutcome>> {
  let outcome = ProgressService::record_session(
    &app.db,
    &app.config.curve,
    &app.config.rules,
    &app.metrics,
    user_id,
    &session,
  )
  .await?;
  Ok(Json(outcome))
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckRequest {
  #[serde(default)]
  pub types: Option<Vec<ConditionType>>,
}

pub async fn check_achievements(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  Json(req): Json<CheckRequest>,
) -> AppResult<Json<Vec<AchievementModel>>> {
  let unlocked = AchievementEngine::check_achievements(
    &app.db,
    &app.config.curve,
    &app.metrics,
    user_id,
    req.types.as_deref(),
  )
  .await?;
  Ok(Json(unlocked))
}

pub async fn list_achievements(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<UserAchievementModel>>> {
  let rows = AchievementEngine::user_achievements(&app.db, user_id).await?;
  Ok(Json(rows))
}

#[derive(Serialize)]
pub struct SeenResponse {
  pub marked: u64,
}

pub async fn mark_notifications_seen(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
) -> AppResult<Json<SeenResponse>> {
  let marked = ProgressService::mark_notifications_seen(&app.db, user_id).await?;
  Ok(Json(SeenResponse { marked }))
}

#[derive(Deserialize)]
pub struct ProgressUpdate {
  pub progress: u8,
}

pub async fn update_achievement_progress(
  State(app): State<Arc<AppState>>,
  Path((user_id, achievement_id)): Path<(i64, String)>,
  Json(update): Json<ProgressUpdate>,
) -> AppResult<Json<AchievementProgress>> {
  AchievementEngine::update_achievement_progress(
    &app.db,
    user_id,
    &achievement_id,
    update.progress,
  )
  .await?;
  achievement_progress(State(app), Path((user_id, achievement_id))).await
}

#[derive(Serialize)]
pub struct AchievementProgress {
  pub achievement_id: String,
  pub progress: u8,
}

pub async fn achievement_progress(
  State(app): State<Arc<AppState>>,
  Path((user_id, achievement_id)): Path<(i64, String)>,
) -> AppResult<Json<AchievementProgress>> {
  let progress =
    AchievementEngine::get_user_progress(&app.db, &app.metrics, user_id, &achievement_id).await?;
  Ok(Json(AchievementProgress { achievement_id, progress }))
}

#[derive(Deserialize)]
pub struct ItemCreated {
  pub item_id: String,
}

pub async fn record_card_created(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  Json(req): Json<ItemCreated>,
) -> AppResult<Json<Vec<AchievementModel>>> {
  ProgressService::record_card_created(
    &app.db,
    &app.config.curve,
    &app.config.rules,
    user_id,
    &req.item_id,
  )
  .await?;
  let unlocked =
    AchievementEngine::check_achievements(&app.db, &app.config.curve, &app.metrics, user_id, None)
      .await?;
  Ok(Json(unlocked))
}

pub async fn record_deck_created(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  Json(req): Json<ItemCreated>,
) -> AppResult<Json<Vec<AchievementModel>>> {
  ProgressService::record_deck_created(
    &app.db,
    &app.config.curve,
    &app.config.rules,
    user_id,
    &req.item_id,
  )
  .await?;
  let unlocked =
    AchievementEngine::check_achievements(&app.db, &app.config.curve, &app.metrics, user_id, None)
      .await?;
  Ok(Json(unlocked))
}

pub async fn get_streak(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
) -> AppResult<Json<Option<StreakModel>>> {
  let streak = StreakService::get(&app.db, user_id).await?;
  Ok(Json(streak))
}

pub async fn recalculate_streak(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<StreakDayModel>>> {
  let today = chrono::Utc::now().date_naive();
  let history = StreakService::recalculate(&app.db, user_id, today).await?;
  Ok(Json(history))
}

#[derive(Serialize)]
pub struct Status {
  pub success: bool,
}

#[derive(Deserialize)]
pub struct PushToken {
  pub token: Option<String>,
}

pub async fn set_push_token(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
  Json(req): Json<PushToken>,
) -> AppResult<Json<Status>> {
  UserService::set_push_token(&app.db, user_id, req.token).await?;
  Ok(Json(Status { success: true }))
}

pub async fn user_progress(
  State(app): State<Arc<AppState>>,
  Path(user_id): Path<i64>,
) -> AppResult<Json<UserProgressModel>> {
  let progress = ProgressService::get(&app.db, user_id).await?;
  Ok(Json(progress))
}

pub async fn get_ranking(
  State(app): State<Arc<AppState>>,
  Path((period, key)): Path<(Period, String)>,
) -> AppResult<Json<Option<RankingView>>> {
  let view = RankingService::get_ranking(&app.db, period, &key).await?;
  Ok(Json(view))
}

#[derive(Serialize)]
pub struct RankPosition {
  pub rank: Option<u32>,
}

pub async fn rank_position(
  State(app): State<Arc<AppState>>,
  Path((period, key, user_id)): Path<(Period, String, i64)>,
) -> Json<RankPosition> {
  let rank = RankingService::user_rank_position(&app.db, user_id, period, &key).await;
  Json(RankPosition { rank })
}

pub async fn refresh_ranking(
  State(app): State<Arc<AppState>>,
  Path((period, key)): Path<(Period, String)>,
) -> AppResult<Json<RankingView>> {
  let view = RankingService::update_ranking(&app.db, period, &key).await?;
  Ok(Json(view))
}
