use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::message;

/// Per-partner read/delete state for broadcast announcements.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "announcement_reads")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: Uuid,
  #[sea_orm(primary_key, auto_increment = false)]
  pub message_id: i32,
  pub is_read: bool,
  pub is_deleted: bool,
  pub read_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  // No partner foreign key: read/delete markers may also belong to admin
  // identities, which have no profile row.
  #[sea_orm(
    belongs_to = "message::Entity",
    from = "Column::MessageId",
    to = "message::Column::Id"
  )]
  Message,
}

impl Related<message::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Message.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
