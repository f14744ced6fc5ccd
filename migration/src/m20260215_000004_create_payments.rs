use sea_orm_migration::prelude::*;

use super::m20260215_000001_create_partners::Partners;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Payments::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Payments::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Payments::UserId).uuid().not_null())
          .col(
            ColumnDef::new(Payments::AmountRequestedCents)
              .big_integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(Payments::Status)
              .string()
              .not_null()
              .default("requested"),
          )
          .col(ColumnDef::new(Payments::RequestedAt).date_time().not_null())
          .col(ColumnDef::new(Payments::ProcessedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_payments_partner")
              .from(Payments::Table, Payments::UserId)
              .to(Partners::Table, Partners::UserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_payments_user")
          .table(Payments::Table)
          .col(Payments::UserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Payments::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Payments {
  Table,
  Id,
  UserId,
  AmountRequestedCents,
  Status,
  RequestedAt,
  ProcessedAt,
}
