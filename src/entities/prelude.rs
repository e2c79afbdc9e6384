//! Entity prelude for convenient imports

pub use super::achievement::{
  ActiveModel as AchievementActiveModel, ConditionType, Entity as Achievement,
  Model as AchievementModel, Tier,
};
pub use super::daily_progress::{
  ActiveModel as DailyProgressActiveModel, Entity as DailyProgress, Model as DailyProgressModel,
};
pub use super::ranking_snapshot::{
  ActiveModel as RankingSnapshotActiveModel, Entity as RankingSnapshot,
  Model as RankingSnapshotModel, Period,
};
pub use super::streak::{ActiveModel as StreakActiveModel, Entity as Streak, Model as StreakModel};
pub use super::streak_day::{
  ActiveModel as StreakDayActiveModel, Entity as StreakDay, Model as StreakDayModel,
};
pub use super::user::{ActiveModel as UserActiveModel, Entity as User, Model as UserModel};
pub use super::user_achievement::{
  ActiveModel as UserAchievementActiveModel, Entity as UserAchievement,
  Model as UserAchievementModel,
};
pub use super::user_progress::{
  ActiveModel as UserProgressActiveModel, Entity as UserProgress, Model as UserProgressModel,
};
pub use super::xp_transaction::{
  ActiveModel as XpTransactionActiveModel, Entity as XpTransaction, Model as XpTransactionModel,
  XpSource,
};
