use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{commission, lead, payment};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum UserType {
  /// Business partner, rewarded with a 5% commission on the net sale.
  #[sea_orm(string_value = "professionnel")]
  #[serde(rename = "professionnel")]
  Business,
  /// Individual partner, rewarded with fixed vouchers, capped per year.
  #[sea_orm(string_value = "particulier")]
  #[serde(rename = "particulier")]
  #[default]
  Individual,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "partners")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: Uuid,
  pub full_name: String,
  pub user_type: UserType,
  pub email: String,
  pub phone: String,
  pub city: String,
  pub siret: Option<String>,
  pub gdpr_consent_date: DateTime,
  /// Anchors the partner's reward year (anniversary window).
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "lead::Entity")]
  Leads,
  #[sea_orm(has_many = "commission::Entity")]
  Commissions,
  #[sea_orm(has_many = "payment::Entity")]
  Payments,
}

impl Related<lead::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Leads.def()
  }
}

impl Related<commission::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Commissions.def()
  }
}

impl Related<payment::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Payments.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
