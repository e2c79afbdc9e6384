//! User service - handles user registration and profile lookups

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::entities::prelude::*;
use crate::error::{AppError, AppResult};

pub struct UserService;

impl UserService {
  /// Get or create a user by id (auto-registration on first activity)
  pub async fn get_or_create(
    db: &DatabaseConnection,
    user_id: i64,
    username: Option<String>,
  ) -> AppResult<UserModel> {
    if let Some(user) = User::find_by_id(user_id).one(db).await? {
      return Ok(user);
    }

    let now = Utc::now().naive_utc();
    let user = UserActiveModel {
      id: Set(user_id),
      username: Set(username),
      push_token: Set(None),
      created_at: Set(now),
    };

    let user = user.insert(db).await?;
    Ok(user)
  }

  /// Get user by id
  pub async fn get_by_id(db: &DatabaseConnection, user_id: i64) -> AppResult<Option<UserModel>> {
    let user = User::find_by_id(user_id).one(db).await?;
    Ok(user)
  }

  /// Update the push-notification token consumed by the notifier
  pub async fn set_push_token(
    db: &DatabaseConnection,
    user_id: i64,
    token: Option<String>,
  ) -> AppResult<()> {
    let user = User::find_by_id(user_id)
      .one(db)
      .await?
      .ok_or(AppError::UserNotFound)?;

    let mut user: UserActiveModel = user.into();
    user.push_token = Set(token);
    user.update(db).await?;
    Ok(())
  }

  /// All registered user ids, for cross-user aggregation passes
  pub async fn all_ids(db: &DatabaseConnection) -> AppResult<Vec<i64>> {
    let users = User::find().all(db).await?;
    Ok(users.into_iter().map(|u| u.id).collect())
  }
}
