//! Gamification Server - achievement, XP and streak engine for a study app
//!
//! Architecture:
//! - SeaORM for database access (SQLite)
//! - Axum for HTTP API with rate limiting
//! - Tokio for async runtime
//!
//! Ranking refresh and achievement checks are driven externally through the
//! HTTP surface; there is no in-process scheduler.

mod entities;
mod error;
mod handlers;
mod migration;
mod prelude;
mod services;
mod state;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::prelude::*;
use crate::state::AppState;

#[tokio::main]
async fn main() {
  dotenvy::dotenv().ok();

  // Initialize tracing
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "gamify=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:gamify.db?mode=rwc".into());

  info!("Starting Gamification Server v{}", env!("CARGO_PKG_VERSION"));

  // Initialize application state (connects, migrates, seeds the catalog)
  let app_state = Arc::new(AppState::new(&db_url).await);

  // Configure rate limiting (100 requests per minute per IP)
  let governor_conf = Arc::new(
    GovernorConfigBuilder::default()
      .per_second(2)
      .burst_size(100)
      .finish()
      .expect("Failed to build rate limiter config"),
  );

  let governor_limiter = governor_conf.limiter().clone();

  // Spawn rate limiter cleanup task
  tokio::spawn(async move {
    loop {
      tokio::time::sleep(Duration::from_secs(60)).await;
      governor_limiter.retain_recent();
    }
  });

  // Build router with middleware
  let app = Router::new()
    // API endpoints
    .route("/api/users/{id}/sessions", post(handlers::record_session))
    .route("/api/users/{id}/cards", post(handlers::record_card_created))
    .route("/api/users/{id}/decks", post(handlers::record_deck_created))
    .route("/api/users/{id}/achievements", get(handlers::list_achievements))
    .route("/api/users/{id}/achievements/check", post(handlers::check_achievements))
    .route("/api/users/{id}/achievements/seen", post(handlers::mark_notifications_seen))
    .route(
      "/api/users/{id}/achievements/{achievement_id}/progress",
      get(handlers::achievement_progress).put(handlers::update_achievement_progress),
    )
    .route("/api/users/{id}/progress", get(handlers::user_progress))
    .route("/api/users/{id}/streak", get(handlers::get_streak))
    .route("/api/users/{id}/streak/recalculate", post(handlers::recalculate_streak))
    .route("/api/users/{id}/push-token", post(handlers::set_push_token))
    .route("/api/rankings/{period}/{key}", get(handlers::get_ranking))
    .route("/api/rankings/{period}/{key}/refresh", post(handlers::refresh_ranking))
    .route("/api/rankings/{period}/{key}/users/{id}", get(handlers::rank_position))
    .route("/health", get(handlers::health))
    // Middleware
    .layer(
      ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(
          CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        ),
    )
    .with_state(app_state);

  // Start HTTP server
  let port: u16 = env::var("PORT")
    .ok()
    .and_then(|p| p.parse().ok())
    .unwrap_or(3000);
  let addr = SocketAddr::from(([0, 0, 0, 0], port));

  info!("HTTP server listening on {}", addr);

  let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind");
  axum::serve(listener, app).await.expect("Server error");
}
