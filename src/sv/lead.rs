use crate::{
  entity::{
    CommissionKind, LeadStatus, UserType, commission, lead, partner,
  },
  prelude::*,
  sv::{
    ledger::{Ledger, NewReward},
    reward, window,
  },
};

pub struct Lead<'a> {
  db: &'a DatabaseConnection,
}

pub struct NewLead {
  pub prospect_name: String,
  pub prospect_phone: String,
  pub prospect_email: String,
  pub prospect_city: Option<String>,
  pub notes: Option<String>,
}

/// Outcome of an admin status update: the updated lead and the reward
/// created by an installation, if any.
pub struct StatusUpdate {
  pub lead: lead::Model,
  pub reward: Option<commission::Model>,
}

impl<'a> Lead<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn submit(
    &self,
    partner_id: Uuid,
    new: NewLead,
  ) -> Result<lead::Model> {
    partner::Entity::find_by_id(partner_id)
      .one(self.db)
      .await?
      .ok_or(Error::PartnerNotFound)?;

    let now = Utc::now().naive_utc();
    Ok(
      lead::ActiveModel {
        id: NotSet,
        user_id: Set(partner_id),
        prospect_name: Set(new.prospect_name),
        prospect_phone: Set(new.prospect_phone),
        prospect_email: Set(new.prospect_email),
        prospect_city: Set(new.prospect_city),
        notes: Set(new.notes),
        status: Set(LeadStatus::Submitted),
        amount_ht_cents: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
      }
      .insert(self.db)
      .await?,
    )
  }

  /// A partner's leads, newest first, with their reward when one exists.
  pub async fn for_partner(
    &self,
    partner_id: Uuid,
  ) -> Result<Vec<(lead::Model, Option<commission::Model>)>> {
    Ok(
      lead::Entity::find()
        .filter(lead::Column::UserId.eq(partner_id))
        .order_by_desc(lead::Column::CreatedAt)
        .find_also_related(commission::Entity)
        .all(self.db)
        .await?,
    )
  }

  /// Every lead in the system with its owning partner, newest first.
  pub async fn all_with_partner(
    &self,
  ) -> Result<Vec<(lead::Model, Option<partner::Model>)>> {
    Ok(
      lead::Entity::find()
        .order_by_desc(lead::Column::CreatedAt)
        .find_also_related(partner::Entity)
        .all(self.db)
        .await?,
    )
  }

  /// Admin status update. Transitions are unrestricted in direction; only
  /// entry into `installé` has preconditions and side effects, and those
  /// run in a single transaction with the update itself:
  ///
  /// - business partner: a positive net amount is mandatory, the reward is
  ///   5% of it;
  /// - individual partner: the annual cap applies, and the voucher tier is
  ///   the installed-referral ordinal within the current window.
  pub async fn update_status(
    &self,
    lead_id: i32,
    new_status: LeadStatus,
    amount_ht_cents: Option<i64>,
  ) -> Result<StatusUpdate> {
    let txn = self.db.begin().await?;

    let (lead, partner) = lead::Entity::find_by_id(lead_id)
      .find_also_related(partner::Entity)
      .one(&txn)
      .await?
      .ok_or(Error::LeadNotFound)?;
    let partner = partner.ok_or(Error::PartnerNotFound)?;

    let now = Utc::now().naive_utc();
    let installing = new_status == LeadStatus::Installed;

    if installing {
      match partner.user_type {
        UserType::Business => {
          if !amount_ht_cents.is_some_and(|cents| cents > 0) {
            return Err(Error::InvalidArgs(
              "Le montant HT est obligatoire et doit être positif pour les \
               professionnels"
                .into(),
            ));
          }
        }
        UserType::Individual => {
          let window = window::current_window(partner.created_at, now);
          let installed =
            window::installed_in_window(&txn, partner.user_id, &window)
              .await?;
          if installed >= window::ANNUAL_CAP {
            return Err(Error::AnnualCapReached { next_start: window.end });
          }
        }
      }
    }

    let mut update = lead::ActiveModel {
      status: Set(new_status),
      updated_at: Set(now),
      ..lead.into()
    };
    if let Some(cents) = amount_ht_cents {
      update.amount_ht_cents = Set(Some(cents));
    }
    let lead = update.update(&txn).await?;

    let reward = if installing {
      Self::install_reward(&txn, &lead, &partner, now).await?
    } else {
      None
    };

    txn.commit().await?;
    Ok(StatusUpdate { lead, reward })
  }

  async fn install_reward<C: ConnectionTrait>(
    conn: &C,
    lead: &lead::Model,
    partner: &partner::Model,
    now: DateTime,
  ) -> Result<Option<commission::Model>> {
    match partner.user_type {
      UserType::Business => {
        let basis = lead.amount_ht_cents.ok_or_else(|| {
          Error::Internal(format!(
            "installed business lead {} without net amount",
            lead.id
          ))
        })?;

        Ledger::create_reward(
          conn,
          NewReward {
            lead_id: lead.id,
            user_id: partner.user_id,
            amount_cents: reward::business_commission(basis),
            kind: CommissionKind::Commission,
            amount_ht_cents: Some(basis),
            parrainage_count_year: None,
          },
        )
        .await
      }
      UserType::Individual => {
        let window = window::current_window(partner.created_at, now);
        // Post-update count: includes the lead just installed when its
        // submission date falls inside the window.
        let ordinal =
          window::installed_in_window(conn, partner.user_id, &window).await?;

        match reward::voucher_for_ordinal(ordinal) {
          Some(amount) => {
            Ledger::create_reward(
              conn,
              NewReward {
                lead_id: lead.id,
                user_id: partner.user_id,
                amount_cents: amount,
                kind: CommissionKind::Voucher,
                amount_ht_cents: None,
                parrainage_count_year: Some(ordinal as i32),
              },
            )
            .await
          }
          None => {
            debug!("no voucher tier for ordinal {ordinal}, lead {}", lead.id);
            Ok(None)
          }
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::{fixtures, test_db};

  fn days_ago(days: i64) -> DateTime {
    Utc::now().naive_utc() - TimeDelta::days(days)
  }

  #[tokio::test]
  async fn test_submit_requires_profile() {
    let db = test_db::setup().await;

    let result = Lead::new(&db)
      .submit(
        Uuid::new_v4(),
        NewLead {
          prospect_name: "Marie Martin".into(),
          prospect_phone: "0605060708".into(),
          prospect_email: "marie@example.com".into(),
          prospect_city: None,
          notes: None,
        },
      )
      .await;

    assert!(matches!(result, Err(Error::PartnerNotFound)));
  }

  #[tokio::test]
  async fn test_submit_starts_in_soumis() {
    let db = test_db::setup().await;
    let partner =
      fixtures::partner(&db, UserType::Individual, days_ago(10)).await;

    let lead = Lead::new(&db)
      .submit(
        partner.user_id,
        NewLead {
          prospect_name: "Marie Martin".into(),
          prospect_phone: "0605060708".into(),
          prospect_email: "marie@example.com".into(),
          prospect_city: Some("Hyères".into()),
          notes: Some("Toit plat".into()),
        },
      )
      .await
      .unwrap();

    assert_eq!(lead.status, LeadStatus::Submitted);
    assert_eq!(lead.amount_ht_cents, None);
  }

  #[tokio::test]
  async fn test_business_install_requires_positive_amount() {
    let db = test_db::setup().await;
    let partner =
      fixtures::partner(&db, UserType::Business, days_ago(30)).await;
    let lead =
      fixtures::lead(&db, partner.user_id, LeadStatus::Signed, days_ago(5))
        .await;

    let sv = Lead::new(&db);

    for amount in [None, Some(0), Some(-100)] {
      let result =
        sv.update_status(lead.id, LeadStatus::Installed, amount).await;
      assert!(matches!(result, Err(Error::InvalidArgs(_))));
    }

    // Nothing moved, nothing was rewarded
    let lead = lead::Entity::find_by_id(lead.id)
      .one(&db)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(lead.status, LeadStatus::Signed);
    assert_eq!(commission::Entity::find().count(&db).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_business_install_creates_five_percent_commission() {
    let db = test_db::setup().await;
    let partner =
      fixtures::partner(&db, UserType::Business, days_ago(30)).await;
    let lead =
      fixtures::lead(&db, partner.user_id, LeadStatus::Signed, days_ago(5))
        .await;

    // 10 000€ HT -> 500€ commission
    let outcome = Lead::new(&db)
      .update_status(lead.id, LeadStatus::Installed, Some(1_000_000))
      .await
      .unwrap();

    assert_eq!(outcome.lead.status, LeadStatus::Installed);
    assert_eq!(outcome.lead.amount_ht_cents, Some(1_000_000));

    let reward = outcome.reward.unwrap();
    assert_eq!(reward.amount_cents, 50_000);
    assert_eq!(reward.kind, CommissionKind::Commission);
    assert_eq!(reward.amount_ht_cents, Some(1_000_000));
  }

  #[tokio::test]
  async fn test_repeated_install_creates_single_reward() {
    let db = test_db::setup().await;
    let partner =
      fixtures::partner(&db, UserType::Business, days_ago(30)).await;
    let lead =
      fixtures::lead(&db, partner.user_id, LeadStatus::Signed, days_ago(5))
        .await;

    let sv = Lead::new(&db);
    let first = sv
      .update_status(lead.id, LeadStatus::Installed, Some(1_000_000))
      .await
      .unwrap();
    assert!(first.reward.is_some());

    let second = sv
      .update_status(lead.id, LeadStatus::Installed, Some(1_000_000))
      .await
      .unwrap();
    assert!(second.reward.is_none());

    assert_eq!(commission::Entity::find().count(&db).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_individual_vouchers_follow_the_grid() {
    let db = test_db::setup().await;
    let partner =
      fixtures::partner(&db, UserType::Individual, days_ago(100)).await;
    let sv = Lead::new(&db);

    for expected in [25_000, 50_000, 90_000] {
      let lead = fixtures::lead(
        &db,
        partner.user_id,
        LeadStatus::Submitted,
        days_ago(1),
      )
      .await;
      let outcome = sv
        .update_status(lead.id, LeadStatus::Installed, None)
        .await
        .unwrap();

      let reward = outcome.reward.unwrap();
      assert_eq!(reward.amount_cents, expected);
      assert_eq!(reward.kind, CommissionKind::Voucher);
    }

    let third = Ledger::new(&db)
      .for_partner(partner.user_id)
      .await
      .unwrap()
      .into_iter()
      .find(|c| c.amount_cents == 90_000)
      .unwrap();
    assert_eq!(third.parrainage_count_year, Some(3));
  }

  #[tokio::test]
  async fn test_sixth_install_in_window_is_rejected() {
    let db = test_db::setup().await;
    let partner =
      fixtures::partner(&db, UserType::Individual, days_ago(100)).await;
    let sv = Lead::new(&db);

    for _ in 0..5 {
      let lead = fixtures::lead(
        &db,
        partner.user_id,
        LeadStatus::Submitted,
        days_ago(2),
      )
      .await;
      sv.update_status(lead.id, LeadStatus::Installed, None).await.unwrap();
    }

    let sixth = fixtures::lead(
      &db,
      partner.user_id,
      LeadStatus::Submitted,
      days_ago(1),
    )
    .await;
    let result = sv.update_status(sixth.id, LeadStatus::Installed, None).await;

    match result {
      Err(Error::AnnualCapReached { next_start }) => {
        let window = window::current_window(
          partner.created_at,
          Utc::now().naive_utc(),
        );
        assert_eq!(next_start, window.end);
      }
      Err(other) => panic!("unexpected error: {other:?}"),
      Ok(_) => panic!("expected cap rejection"),
    }

    // The rejected transition left no trace
    let sixth = lead::Entity::find_by_id(sixth.id)
      .one(&db)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(sixth.status, LeadStatus::Submitted);
    assert_eq!(commission::Entity::find().count(&db).await.unwrap(), 5);
  }

  #[tokio::test]
  async fn test_window_resets_the_voucher_ordinal() {
    let db = test_db::setup().await;
    // Profile is 400 days old: leads submitted ~380 days ago belong to the
    // previous window, recent ones to the current window.
    let partner =
      fixtures::partner(&db, UserType::Individual, days_ago(400)).await;
    let sv = Lead::new(&db);

    for _ in 0..3 {
      let lead = fixtures::lead(
        &db,
        partner.user_id,
        LeadStatus::Submitted,
        days_ago(380),
      )
      .await;
      sv.update_status(lead.id, LeadStatus::Installed, None).await.unwrap();
    }

    // First install of the new window restarts at tier 1 (250€), not 1150€
    let lead = fixtures::lead(
      &db,
      partner.user_id,
      LeadStatus::Submitted,
      days_ago(3),
    )
    .await;
    let outcome =
      sv.update_status(lead.id, LeadStatus::Installed, None).await.unwrap();

    let reward = outcome.reward.unwrap();
    assert_eq!(reward.amount_cents, 25_000);
    assert_eq!(reward.parrainage_count_year, Some(1));
  }

  #[tokio::test]
  async fn test_non_install_transitions_have_no_side_effects() {
    let db = test_db::setup().await;
    let partner =
      fixtures::partner(&db, UserType::Individual, days_ago(30)).await;
    let lead = fixtures::lead(
      &db,
      partner.user_id,
      LeadStatus::Submitted,
      days_ago(1),
    )
    .await;

    let sv = Lead::new(&db);
    for status in [LeadStatus::Visited, LeadStatus::Signed, LeadStatus::Submitted]
    {
      let outcome = sv.update_status(lead.id, status, None).await.unwrap();
      assert_eq!(outcome.lead.status, status);
      assert!(outcome.reward.is_none());
    }

    assert_eq!(commission::Entity::find().count(&db).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_unknown_lead_is_rejected() {
    let db = test_db::setup().await;

    let result =
      Lead::new(&db).update_status(999, LeadStatus::Visited, None).await;
    assert!(matches!(result, Err(Error::LeadNotFound)));
  }
}
