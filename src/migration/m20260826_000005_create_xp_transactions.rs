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
          .table(XpTransactions::Table)
          .if_not_exists()
          .col(ColumnDef::new(XpTransactions::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(XpTransactions::UserId).big_integer().not_null())
          .col(ColumnDef::new(XpTransactions::Amount).big_integer().not_null())
          .col(ColumnDef::new(XpTransactions::Source).text().not_null())
          .col(ColumnDef::new(XpTransactions::SourceId).text())
          .col(
            ColumnDef::new(XpTransactions::Description)
              .text()
              .not_null()
              .default(""),
          )
          .col(ColumnDef::new(XpTransactions::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_xp_transactions_user")
              .from(XpTransactions::Table, XpTransactions::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    // Count-based achievement checks filter on (user, source).
    manager
      .create_index(
        Index::create()
          .name("idx_xp_transactions_user_source")
          .table(XpTransactions::Table)
          .col(XpTransactions::UserId)
          .col(XpTransactions::Source)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(XpTransactions::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum XpTransactions {
  Table,
  Id,
  UserId,
  Amount,
  Source,
  SourceId,
  Description,
  CreatedAt,
}
