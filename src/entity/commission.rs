use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{lead, partner};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum CommissionKind {
  /// 5% of the net sale amount, for business partners.
  #[sea_orm(string_value = "commission_euro")]
  #[serde(rename = "commission_euro")]
  #[default]
  Commission,
  /// Fixed voucher from the annual grid, for individual partners.
  #[sea_orm(string_value = "bon_achat")]
  #[serde(rename = "bon_achat")]
  Voucher,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "paid")]
  Paid,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commissions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  /// Unique: at most one reward per lead, enforced by the storage layer.
  #[sea_orm(unique)]
  pub lead_id: i32,
  pub user_id: Uuid,
  pub amount_cents: i64,
  /// Net sale basis for percentage commissions.
  pub amount_ht_cents: Option<i64>,
  pub kind: CommissionKind,
  /// Voucher tier snapshot: the partner's installed-referral ordinal
  /// within the eligibility window at award time.
  pub parrainage_count_year: Option<i32>,
  pub status: CommissionStatus,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "lead::Entity",
    from = "Column::LeadId",
    to = "lead::Column::Id"
  )]
  Lead,
  #[sea_orm(
    belongs_to = "partner::Entity",
    from = "Column::UserId",
    to = "partner::Column::UserId"
  )]
  Partner,
}

impl Related<lead::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Lead.def()
  }
}

impl Related<partner::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Partner.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
