use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{commission, partner};

/// Lifecycle of a lead. The order is the usual commercial funnel, but
/// transitions are admin-set and not restricted to it; only entry into
/// `Installed` has side effects.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum LeadStatus {
  #[sea_orm(string_value = "soumis")]
  #[serde(rename = "soumis")]
  #[default]
  Submitted,
  #[sea_orm(string_value = "visité")]
  #[serde(rename = "visité")]
  Visited,
  #[sea_orm(string_value = "signé")]
  #[serde(rename = "signé")]
  Signed,
  #[sea_orm(string_value = "installé")]
  #[serde(rename = "installé")]
  Installed,
}

impl LeadStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      LeadStatus::Submitted => "soumis",
      LeadStatus::Visited => "visité",
      LeadStatus::Signed => "signé",
      LeadStatus::Installed => "installé",
    }
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leads")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub user_id: Uuid,
  pub prospect_name: String,
  pub prospect_phone: String,
  pub prospect_email: String,
  pub prospect_city: Option<String>,
  pub notes: Option<String>,
  pub status: LeadStatus,
  /// Net sale amount in cents, set when a business partner's lead is
  /// installed.
  pub amount_ht_cents: Option<i64>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "partner::Entity",
    from = "Column::UserId",
    to = "partner::Column::UserId"
  )]
  Partner,
  #[sea_orm(has_one = "commission::Entity")]
  Commission,
}

impl Related<partner::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Partner.def()
  }
}

impl Related<commission::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Commission.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
