use sea_orm::SqlErr;

use crate::{
  entity::{
    CommissionStatus, UserType, announcement_read, commission, lead, message,
    partner, payment,
  },
  prelude::*,
  sv,
};

pub struct Partner<'a> {
  db: &'a DatabaseConnection,
}

pub struct NewProfile {
  pub full_name: String,
  pub user_type: UserType,
  pub phone: String,
  pub email: String,
  pub city: String,
  pub siret: Option<String>,
  pub gdpr_consent: bool,
}

pub struct ProfileCheck {
  pub is_complete: bool,
  pub missing_fields: Vec<String>,
  pub profile: Option<partner::Model>,
}

/// Admin roll-up of one partner's activity.
pub struct PartnerStats {
  pub profile: partner::Model,
  pub total_leads: u64,
  pub pending_cents: i64,
  pub paid_cents: i64,
  pub last_activity: Option<DateTime>,
}

pub struct PartnerDetails {
  pub profile: partner::Model,
  pub leads: Vec<lead::Model>,
  pub commissions: Vec<commission::Model>,
  pub payments: Vec<payment::Model>,
  pub messages: Vec<message::Model>,
}

impl<'a> Partner<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Create the profile right after registration. The partner type is
  /// fixed here for good; there is no update path.
  pub async fn create(
    &self,
    user_id: Uuid,
    new: NewProfile,
  ) -> Result<partner::Model> {
    if !new.gdpr_consent {
      return Err(Error::InvalidArgs(
        "Le consentement RGPD est obligatoire".into(),
      ));
    }

    if partner::Entity::find_by_id(user_id).one(self.db).await?.is_some() {
      return Err(Error::ProfileExists);
    }

    let now = Utc::now().naive_utc();
    let inserted = partner::ActiveModel {
      user_id: Set(user_id),
      full_name: Set(new.full_name),
      user_type: Set(new.user_type),
      email: Set(new.email),
      phone: Set(new.phone),
      city: Set(new.city),
      siret: Set(new.siret),
      gdpr_consent_date: Set(now),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(self.db)
    .await;

    match inserted {
      Ok(model) => Ok(model),
      // Two concurrent onboarding calls: the primary key settles it
      Err(err)
        if matches!(
          err.sql_err(),
          Some(SqlErr::UniqueConstraintViolation(_))
        ) =>
      {
        Err(Error::ProfileExists)
      }
      Err(err) => Err(err.into()),
    }
  }

  pub async fn by_id(&self, user_id: Uuid) -> Result<Option<partner::Model>> {
    Ok(partner::Entity::find_by_id(user_id).one(self.db).await?)
  }

  pub async fn get(&self, user_id: Uuid) -> Result<partner::Model> {
    self.by_id(user_id).await?.ok_or(Error::PartnerNotFound)
  }

  pub async fn check(&self, user_id: Uuid) -> Result<ProfileCheck> {
    let Some(profile) = self.by_id(user_id).await? else {
      return Ok(ProfileCheck {
        is_complete: false,
        missing_fields: vec!["profile_not_created".into()],
        profile: None,
      });
    };

    let mut missing = Vec::new();
    for (field, value) in [
      ("full_name", &profile.full_name),
      ("phone", &profile.phone),
      ("email", &profile.email),
    ] {
      if value.trim().is_empty() {
        missing.push(field.to_string());
      }
    }

    let is_complete = missing.is_empty();
    Ok(ProfileCheck {
      is_complete,
      missing_fields: missing,
      profile: is_complete.then_some(profile),
    })
  }

  /// Every partner with lead counts, pending/paid commission totals and
  /// the timestamp of their latest activity, newest profile first.
  pub async fn all_with_stats(&self) -> Result<Vec<PartnerStats>> {
    let partners_with_leads = partner::Entity::find()
      .order_by_desc(partner::Column::CreatedAt)
      .find_with_related(lead::Entity)
      .all(self.db)
      .await?;

    let mut commissions: HashMap<Uuid, Vec<commission::Model>> =
      HashMap::new();
    for commission in commission::Entity::find().all(self.db).await? {
      commissions.entry(commission.user_id).or_default().push(commission);
    }

    let mut payments: HashMap<Uuid, Vec<payment::Model>> = HashMap::new();
    for payment in payment::Entity::find().all(self.db).await? {
      payments.entry(payment.user_id).or_default().push(payment);
    }

    Ok(
      partners_with_leads
        .into_iter()
        .map(|(profile, leads)| {
          let commissions =
            commissions.remove(&profile.user_id).unwrap_or_default();
          let payments =
            payments.remove(&profile.user_id).unwrap_or_default();

          let pending_cents = commissions
            .iter()
            .filter(|c| c.status == CommissionStatus::Pending)
            .map(|c| c.amount_cents)
            .sum();
          let paid_cents = commissions
            .iter()
            .filter(|c| c.status == CommissionStatus::Paid)
            .map(|c| c.amount_cents)
            .sum();

          let last_activity = leads
            .iter()
            .map(|l| l.updated_at)
            .chain(commissions.iter().map(|c| c.updated_at))
            .chain(payments.iter().map(|p| p.requested_at))
            .max();

          PartnerStats {
            total_leads: leads.len() as u64,
            pending_cents,
            paid_cents,
            last_activity,
            profile,
          }
        })
        .collect(),
    )
  }

  /// Everything the admin panel shows about one partner.
  pub async fn details(&self, user_id: Uuid) -> Result<PartnerDetails> {
    let profile = self.get(user_id).await?;

    let leads = lead::Entity::find()
      .filter(lead::Column::UserId.eq(user_id))
      .order_by_desc(lead::Column::CreatedAt)
      .all(self.db)
      .await?;

    let commissions = sv::Ledger::new(self.db).for_partner(user_id).await?;
    let payments = sv::Payment::new(self.db).for_partner(user_id).await?;

    let messages = message::Entity::find()
      .filter(message::Column::RecipientId.eq(user_id))
      .order_by_desc(message::Column::CreatedAt)
      .all(self.db)
      .await?;

    Ok(PartnerDetails { profile, leads, commissions, payments, messages })
  }

  /// Irreversible admin purge of a partner and everything they own. The
  /// explicit confirmation flag must be set. Deletes run in dependency
  /// order inside one transaction.
  pub async fn purge(
    &self,
    user_id: Uuid,
    confirm: bool,
  ) -> Result<partner::Model> {
    if !confirm {
      return Err(Error::InvalidArgs(
        "Confirmation de suppression requise".into(),
      ));
    }

    let txn = self.db.begin().await?;

    let profile = partner::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::PartnerNotFound)?;

    message::Entity::delete_many()
      .filter(
        message::Column::SenderId
          .eq(user_id)
          .or(message::Column::RecipientId.eq(user_id)),
      )
      .exec(&txn)
      .await?;

    announcement_read::Entity::delete_many()
      .filter(announcement_read::Column::UserId.eq(user_id))
      .exec(&txn)
      .await?;

    commission::Entity::delete_many()
      .filter(commission::Column::UserId.eq(user_id))
      .exec(&txn)
      .await?;

    payment::Entity::delete_many()
      .filter(payment::Column::UserId.eq(user_id))
      .exec(&txn)
      .await?;

    lead::Entity::delete_many()
      .filter(lead::Column::UserId.eq(user_id))
      .exec(&txn)
      .await?;

    partner::Entity::delete_by_id(user_id).exec(&txn).await?;

    txn.commit().await?;

    info!(
      "purged partner {} ({}) and all owned records",
      profile.full_name, profile.user_id
    );
    Ok(profile)
  }
}
