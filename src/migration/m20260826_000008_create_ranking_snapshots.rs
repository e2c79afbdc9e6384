use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(RankingSnapshots::Table)
          .if_not_exists()
          .col(ColumnDef::new(RankingSnapshots::Period).text().not_null())
          .col(ColumnDef::new(RankingSnapshots::Date).text().not_null())
          .col(ColumnDef::new(RankingSnapshots::Entries).json().not_null())
          .col(
            ColumnDef::new(RankingSnapshots::TotalParticipants)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(RankingSnapshots::LastUpdated).date_time().not_null())
          .primary_key(
            Index::create().col(RankingSnapshots::Period).col(RankingSnapshots::Date),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(RankingSnapshots::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum RankingSnapshots {
  Table,
  Period,
  Date,
  Entries,
  TotalParticipants,
  LastUpdated,
}
