use sea_orm_migration::prelude::*;

use super::m20260215_000005_create_messages::Messages;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(AnnouncementReads::Table)
          .if_not_exists()
          .col(ColumnDef::new(AnnouncementReads::UserId).uuid().not_null())
          .col(
            ColumnDef::new(AnnouncementReads::MessageId).integer().not_null(),
          )
          .col(
            ColumnDef::new(AnnouncementReads::IsRead)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(
            ColumnDef::new(AnnouncementReads::IsDeleted)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(AnnouncementReads::ReadAt).date_time().not_null(),
          )
          .primary_key(
            Index::create()
              .col(AnnouncementReads::UserId)
              .col(AnnouncementReads::MessageId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_announcement_reads_message")
              .from(AnnouncementReads::Table, AnnouncementReads::MessageId)
              .to(Messages::Table, Messages::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(AnnouncementReads::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum AnnouncementReads {
  Table,
  UserId,
  MessageId,
  IsRead,
  IsDeleted,
  ReadAt,
}
