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
          .table(Streaks::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Streaks::UserId)
              .big_integer()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(Streaks::Current).integer().not_null().default(0))
          .col(ColumnDef::new(Streaks::Longest).integer().not_null().default(0))
          .col(ColumnDef::new(Streaks::LastUpdate).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_streaks_user")
              .from(Streaks::Table, Streaks::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(StreakDays::Table)
          .if_not_exists()
          .col(ColumnDef::new(StreakDays::UserId).big_integer().not_null())
          .col(ColumnDef::new(StreakDays::Date).text().not_null())
          .col(ColumnDef::new(StreakDays::Count).integer().not_null().default(0))
          .primary_key(Index::create().col(StreakDays::UserId).col(StreakDays::Date))
          .foreign_key(
            ForeignKey::create()
              .name("fk_streak_days_user")
              .from(StreakDays::Table, StreakDays::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(StreakDays::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(Streaks::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Streaks {
  Table,
  UserId,
  Current,
  Longest,
  LastUpdate,
}

#[derive(DeriveIden)]
pub enum StreakDays {
  Table,
  UserId,
  Date,
  Count,
}
