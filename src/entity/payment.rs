use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::partner;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  #[sea_orm(string_value = "requested")]
  #[default]
  Requested,
  #[sea_orm(string_value = "completed")]
  Completed,
  #[sea_orm(string_value = "rejected")]
  Rejected,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub user_id: Uuid,
  /// Pending balance snapshot taken when the request was created.
  pub amount_requested_cents: i64,
  pub status: PaymentStatus,
  pub requested_at: DateTime,
  pub processed_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "partner::Entity",
    from = "Column::UserId",
    to = "partner::Column::UserId"
  )]
  Partner,
}

impl Related<partner::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Partner.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
