use sea_orm::sea_query::Expr;

use crate::{
  entity::{
    CommissionKind, CommissionStatus, LeadStatus, PaymentStatus, UserType,
    commission, lead, partner, payment,
  },
  prelude::*,
  sv::{ledger::Ledger, window},
};

/// Alerts fire this many days before or after a partner's anniversary.
const ALERT_WINDOW_DAYS: i64 = 30;

pub struct Stats<'a> {
  db: &'a DatabaseConnection,
}

pub struct AdminStats {
  pub total_users: u64,
  pub total_leads: u64,
  pub total_commissions_paid_cents: i64,
  pub pending_commission_requests: u64,
  pub anniversary_alerts: u64,
}

pub struct Dashboard {
  pub profile: partner::Model,
  pub total_leads: u64,
  pub leads_submitted: u64,
  pub leads_visited: u64,
  pub leads_signed: u64,
  pub leads_installed: u64,
  pub commission_balance_cents: i64,
  pub recent_leads: Vec<lead::Model>,
}

/// An individual partner close to their anniversary with vouchers still
/// unpaid. `passed` means the anniversary went by within the last 30 days;
/// those come first for the admin to settle.
pub struct AnniversaryAlert {
  pub user_id: Uuid,
  pub full_name: String,
  /// Next anniversary of the profile creation date.
  pub anniversary_date: DateTime,
  pub vouchers_pending_cents: i64,
  pub days_until_anniversary: i64,
  pub passed: bool,
  pub referral_count: u64,
}

impl<'a> Stats<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn admin(&self) -> Result<AdminStats> {
    let total_users = partner::Entity::find().count(self.db).await?;
    let total_leads = lead::Entity::find().count(self.db).await?;

    let paid: Option<Option<i64>> = commission::Entity::find()
      .select_only()
      .column_as(Expr::col(commission::Column::AmountCents).sum(), "total")
      .filter(commission::Column::Status.eq(CommissionStatus::Paid))
      .into_tuple()
      .one(self.db)
      .await?;

    let pending_commission_requests = payment::Entity::find()
      .filter(payment::Column::Status.eq(PaymentStatus::Requested))
      .count(self.db)
      .await?;

    let anniversary_alerts = self.anniversary_alerts().await?.len() as u64;

    Ok(AdminStats {
      total_users,
      total_leads,
      total_commissions_paid_cents: paid.flatten().unwrap_or(0),
      pending_commission_requests,
      anniversary_alerts,
    })
  }

  pub async fn dashboard(&self, partner_id: Uuid) -> Result<Dashboard> {
    let profile = partner::Entity::find_by_id(partner_id)
      .one(self.db)
      .await?
      .ok_or(Error::PartnerNotFound)?;

    let leads = lead::Entity::find()
      .filter(lead::Column::UserId.eq(partner_id))
      .order_by_desc(lead::Column::CreatedAt)
      .all(self.db)
      .await?;

    let count_with = |status: LeadStatus| {
      leads.iter().filter(|l| l.status == status).count() as u64
    };
    let total_leads = leads.len() as u64;
    let leads_submitted = count_with(LeadStatus::Submitted);
    let leads_visited = count_with(LeadStatus::Visited);
    let leads_signed = count_with(LeadStatus::Signed);
    let leads_installed = count_with(LeadStatus::Installed);

    let commission_balance_cents =
      Ledger::pending_balance_in(self.db, partner_id).await?;

    Ok(Dashboard {
      total_leads,
      leads_submitted,
      leads_visited,
      leads_signed,
      leads_installed,
      commission_balance_cents,
      recent_leads: leads.into_iter().take(5).collect(),
      profile,
    })
  }

  /// Individual partners with pending vouchers whose anniversary falls
  /// within ±30 days, already-passed anniversaries first, then ascending
  /// by days remaining. One date policy throughout: the same clamped
  /// calendar anniversaries as the eligibility window.
  pub async fn anniversary_alerts(&self) -> Result<Vec<AnniversaryAlert>> {
    let now = Utc::now().naive_utc();

    let partners = partner::Entity::find()
      .filter(partner::Column::UserType.eq(UserType::Individual))
      .all(self.db)
      .await?;

    let mut pending_vouchers: HashMap<Uuid, i64> = HashMap::new();
    for row in commission::Entity::find()
      .filter(commission::Column::Status.eq(CommissionStatus::Pending))
      .filter(commission::Column::Kind.eq(CommissionKind::Voucher))
      .all(self.db)
      .await?
    {
      *pending_vouchers.entry(row.user_id).or_default() += row.amount_cents;
    }

    let mut installed_counts: HashMap<Uuid, u64> = HashMap::new();
    for row in lead::Entity::find()
      .filter(lead::Column::Status.eq(LeadStatus::Installed))
      .all(self.db)
      .await?
    {
      *installed_counts.entry(row.user_id).or_default() += 1;
    }

    let mut alerts: Vec<AnniversaryAlert> = partners
      .into_iter()
      .filter_map(|profile| {
        let pending =
          pending_vouchers.get(&profile.user_id).copied().unwrap_or(0);
        if pending <= 0 {
          return None;
        }

        let window = window::current_window(profile.created_at, now);
        let days_since = (now - window.start).num_days();
        let days_until = (window.end - now).num_days();
        let passed = days_since <= ALERT_WINDOW_DAYS;

        if !passed && days_until > ALERT_WINDOW_DAYS {
          return None;
        }

        Some(AnniversaryAlert {
          user_id: profile.user_id,
          referral_count: installed_counts
            .get(&profile.user_id)
            .copied()
            .unwrap_or(0),
          full_name: profile.full_name,
          anniversary_date: window.end,
          vouchers_pending_cents: pending,
          days_until_anniversary: days_until,
          passed,
        })
      })
      .collect();

    alerts.sort_by_key(|alert| {
      if alert.passed { 0 } else { alert.days_until_anniversary }
    });

    Ok(alerts)
  }
}
