use sea_orm_migration::prelude::*;

use super::{
  m20260215_000001_create_partners::Partners,
  m20260215_000002_create_leads::Leads,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Commissions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Commissions::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Commissions::LeadId).integer().not_null())
          .col(ColumnDef::new(Commissions::UserId).uuid().not_null())
          .col(
            ColumnDef::new(Commissions::AmountCents).big_integer().not_null(),
          )
          .col(ColumnDef::new(Commissions::AmountHtCents).big_integer().null())
          .col(ColumnDef::new(Commissions::Kind).string().not_null())
          .col(
            ColumnDef::new(Commissions::ParrainageCountYear).integer().null(),
          )
          .col(
            ColumnDef::new(Commissions::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(Commissions::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Commissions::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_commissions_lead")
              .from(Commissions::Table, Commissions::LeadId)
              .to(Leads::Table, Leads::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_commissions_partner")
              .from(Commissions::Table, Commissions::UserId)
              .to(Partners::Table, Partners::UserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    // One reward per lead, enforced by the storage layer
    manager
      .create_index(
        Index::create()
          .name("uq_commissions_lead")
          .table(Commissions::Table)
          .col(Commissions::LeadId)
          .unique()
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_commissions_user")
          .table(Commissions::Table)
          .col(Commissions::UserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Commissions::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Commissions {
  Table,
  Id,
  LeadId,
  UserId,
  AmountCents,
  AmountHtCents,
  Kind,
  ParrainageCountYear,
  Status,
  CreatedAt,
  UpdatedAt,
}
