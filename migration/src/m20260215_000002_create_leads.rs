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
          .table(Leads::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Leads::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Leads::UserId).uuid().not_null())
          .col(ColumnDef::new(Leads::ProspectName).string().not_null())
          .col(ColumnDef::new(Leads::ProspectPhone).string().not_null())
          .col(ColumnDef::new(Leads::ProspectEmail).string().not_null())
          .col(ColumnDef::new(Leads::ProspectCity).string().null())
          .col(ColumnDef::new(Leads::Notes).string().null())
          .col(
            ColumnDef::new(Leads::Status)
              .string()
              .not_null()
              .default("soumis"),
          )
          .col(ColumnDef::new(Leads::AmountHtCents).big_integer().null())
          .col(ColumnDef::new(Leads::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Leads::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_leads_partner")
              .from(Leads::Table, Leads::UserId)
              .to(Partners::Table, Partners::UserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_leads_user")
          .table(Leads::Table)
          .col(Leads::UserId)
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_leads_status")
          .table(Leads::Table)
          .col(Leads::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Leads::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Leads {
  Table,
  Id,
  UserId,
  ProspectName,
  ProspectPhone,
  ProspectEmail,
  ProspectCity,
  Notes,
  Status,
  AmountHtCents,
  CreatedAt,
  UpdatedAt,
}
