pub use sea_orm::{Database, DatabaseConnection};
pub use tracing::info;

pub use crate::error::AppResult;
