use sea_orm_migration::prelude::*;

use super::m20260826_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(UserProgress::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(UserProgress::UserId)
              .big_integer()
              .not_null()
              .primary_key(),
          )
          .col(
            ColumnDef::new(UserProgress::Level)
              .integer()
              .not_null()
              .default(1),
          )
          .col(
            ColumnDef::new(UserProgress::CurrentXp)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(UserProgress::TotalXp)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(UserProgress::CurrentStreak)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(UserProgress::LongestStreak)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(UserProgress::TotalCardsReviewed)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(UserProgress::LastActivity).date_time().not_null())
          .col(ColumnDef::new(UserProgress::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_progress_user")
              .from(UserProgress::Table, UserProgress::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(UserProgress::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum UserProgress {
  Table,
  UserId,
  Level,
  CurrentXp,
  TotalXp,
  CurrentStreak,
  LongestStreak,
  TotalCardsReviewed,
  LastActivity,
  CreatedAt,
}
