use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::partner;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
  #[sea_orm(string_value = "admin")]
  Admin,
  #[sea_orm(string_value = "apporteur")]
  #[default]
  Apporteur,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
  /// Broadcast to every partner; read/delete state lives in
  /// `announcement_reads`.
  #[sea_orm(string_value = "announcement")]
  Announcement,
  /// One sender, one recipient; carries its own read flag.
  #[sea_orm(string_value = "private")]
  #[default]
  Private,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub sender_id: Uuid,
  pub sender_type: SenderType,
  pub recipient_id: Option<Uuid>,
  pub message_type: MessageType,
  pub subject: String,
  pub content: String,
  pub is_read: bool,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Senders are partners or admins; admins have no profile row, so the
// join is declared ad hoc rather than as a schema-level foreign key.
impl Related<partner::Entity> for Entity {
  fn to() -> RelationDef {
    Entity::belongs_to(partner::Entity)
      .from(Column::SenderId)
      .to(partner::Column::UserId)
      .into()
  }
}

impl ActiveModelBehavior for ActiveModel {}
