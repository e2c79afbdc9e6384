//! SeaORM Entity definitions
//!
//! This module contains all database entity definitions for the gamification
//! server.

pub mod achievement;
pub mod daily_progress;
pub mod prelude;
pub mod ranking_snapshot;
pub mod streak;
pub mod streak_day;
pub mod user;
pub mod user_achievement;
pub mod user_progress;
pub mod xp_transaction;
