//! Commission/voucher ledger. At most one reward record exists per lead —
//! the unique index on `commissions.lead_id` is the authoritative guard,
//! the lookup is only a fast path.

use sea_orm::{SqlErr, sea_query::Expr};

use crate::{
  entity::{CommissionKind, CommissionStatus, LeadStatus, commission, lead},
  prelude::*,
};

pub struct Ledger<'a> {
  db: &'a DatabaseConnection,
}

pub struct NewReward {
  pub lead_id: i32,
  pub user_id: Uuid,
  pub amount_cents: i64,
  pub kind: CommissionKind,
  /// Net sale basis for percentage commissions.
  pub amount_ht_cents: Option<i64>,
  /// Window ordinal snapshot for vouchers.
  pub parrainage_count_year: Option<i32>,
}

impl<'a> Ledger<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn for_partner(
    &self,
    partner_id: Uuid,
  ) -> Result<Vec<commission::Model>> {
    Ok(
      commission::Entity::find()
        .filter(commission::Column::UserId.eq(partner_id))
        .order_by_desc(commission::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  pub async fn pending_balance(&self, partner_id: Uuid) -> Result<i64> {
    Self::pending_balance_in(self.db, partner_id).await
  }

  /// Sum of the partner's pending rewards; 0 when there are none.
  pub async fn pending_balance_in<C: ConnectionTrait>(
    conn: &C,
    partner_id: Uuid,
  ) -> Result<i64> {
    let total: Option<Option<i64>> = commission::Entity::find()
      .select_only()
      .column_as(Expr::col(commission::Column::AmountCents).sum(), "total")
      .filter(commission::Column::UserId.eq(partner_id))
      .filter(commission::Column::Status.eq(CommissionStatus::Pending))
      .into_tuple()
      .one(conn)
      .await?;

    Ok(total.flatten().unwrap_or(0))
  }

  /// Insert the reward for a lead. A duplicate is a logged no-op, whether
  /// caught by the lookup or by the unique index under a concurrent
  /// transition.
  pub async fn create_reward<C: ConnectionTrait>(
    conn: &C,
    reward: NewReward,
  ) -> Result<Option<commission::Model>> {
    if let Some(existing) = commission::Entity::find()
      .filter(commission::Column::LeadId.eq(reward.lead_id))
      .one(conn)
      .await?
    {
      warn!(
        "lead {} already has reward {}, skipping",
        reward.lead_id, existing.id
      );
      return Ok(None);
    }

    let now = Utc::now().naive_utc();
    let inserted = commission::ActiveModel {
      id: NotSet,
      lead_id: Set(reward.lead_id),
      user_id: Set(reward.user_id),
      amount_cents: Set(reward.amount_cents),
      amount_ht_cents: Set(reward.amount_ht_cents),
      kind: Set(reward.kind),
      parrainage_count_year: Set(reward.parrainage_count_year),
      status: Set(CommissionStatus::Pending),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(conn)
    .await;

    match inserted {
      Ok(model) => Ok(Some(model)),
      Err(err)
        if matches!(
          err.sql_err(),
          Some(SqlErr::UniqueConstraintViolation(_))
        ) =>
      {
        warn!("concurrent reward insert for lead {}, skipping", reward.lead_id);
        Ok(None)
      }
      Err(err) => Err(err.into()),
    }
  }

  /// Flip every reward still pending for the partner to paid. Called only
  /// from payment processing, inside the same transaction that completes
  /// the request.
  pub async fn mark_partner_rewards_paid<C: ConnectionTrait>(
    conn: &C,
    partner_id: Uuid,
  ) -> Result<u64> {
    let now = Utc::now().naive_utc();
    let result = commission::Entity::update_many()
      .col_expr(
        commission::Column::Status,
        Expr::value(CommissionStatus::Paid),
      )
      .col_expr(commission::Column::UpdatedAt, Expr::value(now))
      .filter(commission::Column::UserId.eq(partner_id))
      .filter(commission::Column::Status.eq(CommissionStatus::Pending))
      .exec(conn)
      .await?;

    Ok(result.rows_affected)
  }

  /// Reconciliation scan: leads marked `installé` with no reward row. Can
  /// only happen when reward creation failed after the status update
  /// committed; surfaced for manual follow-up, never auto-repaired.
  pub async fn orphaned_installations(&self) -> Result<Vec<lead::Model>> {
    let rows = lead::Entity::find()
      .filter(lead::Column::Status.eq(LeadStatus::Installed))
      .find_also_related(commission::Entity)
      .all(self.db)
      .await?;

    Ok(
      rows
        .into_iter()
        .filter_map(|(lead, commission)| commission.is_none().then_some(lead))
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::UserType,
    sv::test_utils::{fixtures, test_db},
  };

  #[tokio::test]
  async fn test_pending_balance_defaults_to_zero() {
    let db = test_db::setup().await;

    let balance =
      Ledger::new(&db).pending_balance(Uuid::new_v4()).await.unwrap();
    assert_eq!(balance, 0);
  }

  #[tokio::test]
  async fn test_create_reward_is_idempotent_per_lead() {
    let db = test_db::setup().await;

    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Business, now).await;
    let lead =
      fixtures::lead(&db, partner.user_id, LeadStatus::Installed, now).await;

    let first = Ledger::create_reward(
      &db,
      NewReward {
        lead_id: lead.id,
        user_id: partner.user_id,
        amount_cents: 50_000,
        kind: CommissionKind::Commission,
        amount_ht_cents: Some(1_000_000),
        parrainage_count_year: None,
      },
    )
    .await
    .unwrap();
    assert!(first.is_some());

    let second = Ledger::create_reward(
      &db,
      NewReward {
        lead_id: lead.id,
        user_id: partner.user_id,
        amount_cents: 50_000,
        kind: CommissionKind::Commission,
        amount_ht_cents: Some(1_000_000),
        parrainage_count_year: None,
      },
    )
    .await
    .unwrap();
    assert!(second.is_none());

    let count = commission::Entity::find()
      .filter(commission::Column::LeadId.eq(lead.id))
      .count(&db)
      .await
      .unwrap();
    assert_eq!(count, 1);
  }

  #[tokio::test]
  async fn test_mark_paid_empties_pending_balance() {
    let db = test_db::setup().await;

    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Individual, now).await;

    for amount in [25_000, 50_000] {
      let lead =
        fixtures::lead(&db, partner.user_id, LeadStatus::Installed, now).await;
      Ledger::create_reward(
        &db,
        NewReward {
          lead_id: lead.id,
          user_id: partner.user_id,
          amount_cents: amount,
          kind: CommissionKind::Voucher,
          amount_ht_cents: None,
          parrainage_count_year: Some(1),
        },
      )
      .await
      .unwrap();
    }

    let ledger = Ledger::new(&db);
    assert_eq!(ledger.pending_balance(partner.user_id).await.unwrap(), 75_000);

    let flipped =
      Ledger::mark_partner_rewards_paid(&db, partner.user_id).await.unwrap();
    assert_eq!(flipped, 2);
    assert_eq!(ledger.pending_balance(partner.user_id).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_orphaned_installations_detected() {
    let db = test_db::setup().await;

    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Business, now).await;
    let orphan =
      fixtures::lead(&db, partner.user_id, LeadStatus::Installed, now).await;
    let rewarded =
      fixtures::lead(&db, partner.user_id, LeadStatus::Installed, now).await;
    fixtures::lead(&db, partner.user_id, LeadStatus::Signed, now).await;

    Ledger::create_reward(
      &db,
      NewReward {
        lead_id: rewarded.id,
        user_id: partner.user_id,
        amount_cents: 10_000,
        kind: CommissionKind::Commission,
        amount_ht_cents: Some(200_000),
        parrainage_count_year: None,
      },
    )
    .await
    .unwrap();

    let orphans =
      Ledger::new(&db).orphaned_installations().await.unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, orphan.id);
  }
}
