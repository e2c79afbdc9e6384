use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Achievements::Table)
          .if_not_exists()
          .col(ColumnDef::new(Achievements::Id).text().not_null().primary_key())
          .col(ColumnDef::new(Achievements::Name).text().not_null())
          .col(
            ColumnDef::new(Achievements::Description)
              .text()
              .not_null()
              .default(""),
          )
          .col(ColumnDef::new(Achievements::Tier).text().not_null())
          .col(
            ColumnDef::new(Achievements::XpReward)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Achievements::Icon).text().not_null().default(""))
          .col(ColumnDef::new(Achievements::ConditionType).text().not_null())
          .col(ColumnDef::new(Achievements::ConditionTarget).big_integer().not_null())
          .col(ColumnDef::new(Achievements::ConditionMetric).text())
          .col(
            ColumnDef::new(Achievements::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Achievements::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Achievements {
  Table,
  Id,
  Name,
  Description,
  Tier,
  XpReward,
  Icon,
  ConditionType,
  ConditionTarget,
  ConditionMetric,
  IsActive,
}
