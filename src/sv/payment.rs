use crate::{
  entity::{PaymentStatus, partner, payment},
  prelude::*,
  sv::ledger::Ledger,
};

pub struct Payment<'a> {
  db: &'a DatabaseConnection,
}

/// One page of payment requests with the owning partners resolved.
pub struct PaymentPage {
  pub data: Vec<(payment::Model, Option<partner::Model>)>,
  pub total: u64,
}

pub struct Processed {
  pub request: payment::Model,
  pub rewards_paid: u64,
}

impl<'a> Payment<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Create a payout request carrying a snapshot of the partner's pending
  /// balance. Rejected when nothing is pending.
  pub async fn request(&self, partner_id: Uuid) -> Result<payment::Model> {
    let txn = self.db.begin().await?;

    partner::Entity::find_by_id(partner_id)
      .one(&txn)
      .await?
      .ok_or(Error::PartnerNotFound)?;

    let balance = Ledger::pending_balance_in(&txn, partner_id).await?;
    if balance == 0 {
      return Err(Error::NoPendingRewards);
    }

    let now = Utc::now().naive_utc();
    let request = payment::ActiveModel {
      id: NotSet,
      user_id: Set(partner_id),
      amount_requested_cents: Set(balance),
      status: Set(PaymentStatus::Requested),
      requested_at: Set(now),
      processed_at: Set(None),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(request)
  }

  pub async fn for_partner(
    &self,
    partner_id: Uuid,
  ) -> Result<Vec<payment::Model>> {
    Ok(
      payment::Entity::find()
        .filter(payment::Column::UserId.eq(partner_id))
        .order_by_desc(payment::Column::RequestedAt)
        .all(self.db)
        .await?,
    )
  }

  /// Paginated admin listing, newest first, optionally filtered by status.
  /// `page` is 1-based.
  pub async fn page(
    &self,
    page: u64,
    per_page: u64,
    status: Option<PaymentStatus>,
  ) -> Result<PaymentPage> {
    let mut query = payment::Entity::find();
    if let Some(status) = status {
      query = query.filter(payment::Column::Status.eq(status));
    }

    let paginator = query
      .order_by_desc(payment::Column::RequestedAt)
      .paginate(self.db, per_page);
    let total = paginator.num_items().await?;
    let requests = paginator.fetch_page(page.saturating_sub(1)).await?;

    let partner_ids: Vec<Uuid> =
      requests.iter().map(|request| request.user_id).collect();
    let partners: HashMap<Uuid, partner::Model> = partner::Entity::find()
      .filter(partner::Column::UserId.is_in(partner_ids))
      .all(self.db)
      .await?
      .into_iter()
      .map(|partner| (partner.user_id, partner))
      .collect();

    let data = requests
      .into_iter()
      .map(|request| {
        let partner = partners.get(&request.user_id).cloned();
        (request, partner)
      })
      .collect();

    Ok(PaymentPage { data, total })
  }

  /// Complete (or reject) a request. Completion flips every reward still
  /// pending at processing time — deliberately not just those behind the
  /// snapshot: rewards accrued since the request are paid out with it.
  pub async fn process(
    &self,
    payment_id: i32,
    outcome: PaymentStatus,
    processed_at: Option<DateTime>,
  ) -> Result<Processed> {
    if outcome == PaymentStatus::Requested {
      return Err(Error::InvalidArgs(
        "Statut de traitement invalide".into(),
      ));
    }

    let txn = self.db.begin().await?;

    let request = payment::Entity::find_by_id(payment_id)
      .filter(payment::Column::Status.eq(PaymentStatus::Requested))
      .one(&txn)
      .await?
      .ok_or(Error::PaymentNotFound)?;

    let when = processed_at.unwrap_or_else(|| Utc::now().naive_utc());
    let request = payment::ActiveModel {
      status: Set(outcome),
      processed_at: Set(Some(when)),
      ..request.into()
    }
    .update(&txn)
    .await?;

    let rewards_paid = if outcome == PaymentStatus::Completed {
      Ledger::mark_partner_rewards_paid(&txn, request.user_id).await?
    } else {
      0
    };

    txn.commit().await?;
    Ok(Processed { request, rewards_paid })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{CommissionKind, CommissionStatus, LeadStatus, UserType},
    sv::{
      ledger::NewReward,
      test_utils::{fixtures, test_db},
    },
  };

  async fn pending_reward(
    db: &DatabaseConnection,
    partner_id: Uuid,
    amount_cents: i64,
  ) {
    let now = Utc::now().naive_utc();
    let lead =
      fixtures::lead(db, partner_id, LeadStatus::Installed, now).await;
    Ledger::create_reward(
      db,
      NewReward {
        lead_id: lead.id,
        user_id: partner_id,
        amount_cents,
        kind: CommissionKind::Voucher,
        amount_ht_cents: None,
        parrainage_count_year: Some(1),
      },
    )
    .await
    .unwrap()
    .unwrap();
  }

  #[tokio::test]
  async fn test_request_with_zero_balance_fails() {
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Individual, now).await;

    let result = Payment::new(&db).request(partner.user_id).await;
    assert!(matches!(result, Err(Error::NoPendingRewards)));
    assert_eq!(payment::Entity::find().count(&db).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_request_snapshots_the_pending_balance() {
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Individual, now).await;
    pending_reward(&db, partner.user_id, 75_000).await;

    let request = Payment::new(&db).request(partner.user_id).await.unwrap();
    assert_eq!(request.amount_requested_cents, 75_000);
    assert_eq!(request.status, PaymentStatus::Requested);
    assert!(request.processed_at.is_none());
  }

  #[tokio::test]
  async fn test_processing_pays_rewards_accrued_after_the_request() {
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Individual, now).await;
    let sv = Payment::new(&db);

    pending_reward(&db, partner.user_id, 75_000).await;
    let request = sv.request(partner.user_id).await.unwrap();

    // 300€ accrues between the request and its processing
    pending_reward(&db, partner.user_id, 30_000).await;

    let processed = sv
      .process(request.id, PaymentStatus::Completed, None)
      .await
      .unwrap();

    assert_eq!(processed.request.status, PaymentStatus::Completed);
    assert!(processed.request.processed_at.is_some());
    // The snapshot is untouched, but both rewards are paid out
    assert_eq!(processed.request.amount_requested_cents, 75_000);
    assert_eq!(processed.rewards_paid, 2);
    assert_eq!(
      Ledger::new(&db).pending_balance(partner.user_id).await.unwrap(),
      0
    );
  }

  #[tokio::test]
  async fn test_processing_twice_fails() {
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Individual, now).await;
    let sv = Payment::new(&db);

    pending_reward(&db, partner.user_id, 25_000).await;
    let request = sv.request(partner.user_id).await.unwrap();

    sv.process(request.id, PaymentStatus::Completed, None).await.unwrap();
    let again =
      sv.process(request.id, PaymentStatus::Completed, None).await;
    assert!(matches!(again, Err(Error::PaymentNotFound)));
  }

  #[tokio::test]
  async fn test_rejection_leaves_rewards_pending() {
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Individual, now).await;
    let sv = Payment::new(&db);

    pending_reward(&db, partner.user_id, 25_000).await;
    let request = sv.request(partner.user_id).await.unwrap();

    let processed = sv
      .process(request.id, PaymentStatus::Rejected, None)
      .await
      .unwrap();

    assert_eq!(processed.request.status, PaymentStatus::Rejected);
    assert_eq!(processed.rewards_paid, 0);
    assert_eq!(
      Ledger::new(&db).pending_balance(partner.user_id).await.unwrap(),
      25_000
    );
  }

  #[tokio::test]
  async fn test_page_filters_by_status() {
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Individual, now).await;
    let sv = Payment::new(&db);

    pending_reward(&db, partner.user_id, 25_000).await;
    let first = sv.request(partner.user_id).await.unwrap();
    sv.process(first.id, PaymentStatus::Completed, None).await.unwrap();

    pending_reward(&db, partner.user_id, 50_000).await;
    sv.request(partner.user_id).await.unwrap();

    let all = sv.page(1, 20, None).await.unwrap();
    assert_eq!(all.total, 2);

    let requested =
      sv.page(1, 20, Some(PaymentStatus::Requested)).await.unwrap();
    assert_eq!(requested.total, 1);
    assert_eq!(requested.data[0].0.amount_requested_cents, 50_000);
    let partner_model = requested.data[0].1.as_ref().unwrap();
    assert_eq!(partner_model.user_id, partner.user_id);
  }

  #[tokio::test]
  async fn test_commission_status_mirror() {
    // A paid-out reward is no longer counted by a later request
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();
    let partner = fixtures::partner(&db, UserType::Individual, now).await;
    let sv = Payment::new(&db);

    pending_reward(&db, partner.user_id, 25_000).await;
    let request = sv.request(partner.user_id).await.unwrap();
    sv.process(request.id, PaymentStatus::Completed, None).await.unwrap();

    pending_reward(&db, partner.user_id, 90_000).await;
    let second = sv.request(partner.user_id).await.unwrap();
    assert_eq!(second.amount_requested_cents, 90_000);

    let statuses: Vec<CommissionStatus> = Ledger::new(&db)
      .for_partner(partner.user_id)
      .await
      .unwrap()
      .into_iter()
      .map(|c| c.status)
      .collect();
    assert!(statuses.contains(&CommissionStatus::Paid));
    assert!(statuses.contains(&CommissionStatus::Pending));
  }
}
