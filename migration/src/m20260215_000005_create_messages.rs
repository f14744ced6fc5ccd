use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Messages::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Messages::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Messages::SenderId).uuid().not_null())
          .col(ColumnDef::new(Messages::SenderType).string().not_null())
          // NULL recipient = broadcast announcement
          .col(ColumnDef::new(Messages::RecipientId).uuid().null())
          .col(ColumnDef::new(Messages::MessageType).string().not_null())
          .col(ColumnDef::new(Messages::Subject).string().not_null())
          .col(ColumnDef::new(Messages::Content).text().not_null())
          .col(
            ColumnDef::new(Messages::IsRead)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(Messages::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Messages::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_messages_recipient")
          .table(Messages::Table)
          .col(Messages::RecipientId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Messages::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Messages {
  Table,
  Id,
  SenderId,
  SenderType,
  RecipientId,
  MessageType,
  Subject,
  Content,
  IsRead,
  CreatedAt,
  UpdatedAt,
}
