use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Partners::Table)
          .if_not_exists()
          .col(ColumnDef::new(Partners::UserId).uuid().not_null().primary_key())
          .col(ColumnDef::new(Partners::FullName).string().not_null())
          .col(ColumnDef::new(Partners::UserType).string().not_null())
          .col(ColumnDef::new(Partners::Email).string().not_null())
          .col(ColumnDef::new(Partners::Phone).string().not_null())
          .col(
            ColumnDef::new(Partners::City)
              .string()
              .not_null()
              .default("Non renseigné"),
          )
          .col(ColumnDef::new(Partners::Siret).string().null())
          .col(
            ColumnDef::new(Partners::GdprConsentDate).date_time().not_null(),
          )
          .col(ColumnDef::new(Partners::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Partners::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Partners::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Partners {
  Table,
  UserId,
  FullName,
  UserType,
  Email,
  Phone,
  City,
  Siret,
  GdprConsentDate,
  CreatedAt,
  UpdatedAt,
}
