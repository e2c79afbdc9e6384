//! Error types for the gamification server

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("Achievement not found")]
  AchievementNotFound,

  #[error("User not found")]
  UserNotFound,

  #[error("Invalid data: {0}")]
  Invalid(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
      AppError::AchievementNotFound => (StatusCode::NOT_FOUND, "Achievement not found"),
      AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
      AppError::Invalid(_) => (StatusCode::BAD_REQUEST, "Invalid data"),
      AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO error"),
      AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    };

    let body = json::json!({
      "success": false,
      "error": message
    });

    (status, axum::Json(body)).into_response()
  }
}

pub type AppResult<T> = Result<T, AppError>;
