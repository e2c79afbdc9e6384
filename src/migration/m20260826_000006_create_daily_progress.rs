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
          .table(DailyProgress::Table)
          .if_not_exists()
          .col(ColumnDef::new(DailyProgress::UserId).big_integer().not_null())
          .col(ColumnDef::new(DailyProgress::Date).text().not_null())
          .col(
            ColumnDef::new(DailyProgress::CardsReviewed)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(DailyProgress::CardsCorrect)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(DailyProgress::GoalMet)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(DailyProgress::XpEarned)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(DailyProgress::StudyTimeMinutes)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(DailyProgress::StudySessions)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(DailyProgress::UpdatedAt).date_time().not_null())
          .primary_key(Index::create().col(DailyProgress::UserId).col(DailyProgress::Date))
          .foreign_key(
            ForeignKey::create()
              .name("fk_daily_progress_user")
              .from(DailyProgress::Table, DailyProgress::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(DailyProgress::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum DailyProgress {
  Table,
  UserId,
  Date,
  CardsReviewed,
  CardsCorrect,
  GoalMet,
  XpEarned,
  StudyTimeMinutes,
  StudySessions,
  UpdatedAt,
}
