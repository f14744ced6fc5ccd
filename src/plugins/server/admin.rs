//! Admin handlers, gated by the injected `AdminPolicy` allow-list.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use super::handlers::Status;
use crate::{
  auth::{Identity, require_admin},
  entity::{
    CommissionKind, LeadStatus, PaymentStatus, UserType, commission, lead,
    message, partner, payment,
  },
  prelude::*,
  state::AppState,
  sv,
  utils::{cents_to_euros, euros_to_cents, format_euros},
};

// ----- stats -----

#[derive(Serialize)]
pub struct AdminStatsResp {
  pub total_users: u64,
  pub total_leads: u64,
  pub total_commissions_paid: f64,
  pub pending_commission_requests: u64,
  pub anniversary_alerts: u64,
}

pub async fn stats(
  State(app): State<Arc<AppState>>,
  identity: Identity,
) -> Result<Json<AdminStatsResp>> {
  require_admin(&app, &identity)?;

  let stats = sv::Stats::new(&app.db).admin().await?;
  Ok(Json(AdminStatsResp {
    total_users: stats.total_users,
    total_leads: stats.total_leads,
    total_commissions_paid: cents_to_euros(
      stats.total_commissions_paid_cents,
    ),
    pending_commission_requests: stats.pending_commission_requests,
    anniversary_alerts: stats.anniversary_alerts,
  }))
}

// ----- users -----

#[derive(Serialize)]
pub struct UserStatsResp {
  pub user_id: Uuid,
  pub full_name: String,
  pub user_type: UserType,
  pub email: String,
  pub phone: String,
  pub city: String,
  pub created_at: DateTime,
  pub total_leads: u64,
  pub pending_commissions: f64,
  pub paid_commissions: f64,
  pub last_activity: Option<DateTime>,
}

pub async fn users_with_stats(
  State(app): State<Arc<AppState>>,
  identity: Identity,
) -> Result<Json<Vec<UserStatsResp>>> {
  require_admin(&app, &identity)?;

  let rows = sv::Partner::new(&app.db).all_with_stats().await?;
  Ok(Json(
    rows
      .into_iter()
      .map(|row| UserStatsResp {
        user_id: row.profile.user_id,
        full_name: row.profile.full_name,
        user_type: row.profile.user_type,
        email: row.profile.email,
        phone: row.profile.phone,
        city: row.profile.city,
        created_at: row.profile.created_at,
        total_leads: row.total_leads,
        pending_commissions: cents_to_euros(row.pending_cents),
        paid_commissions: cents_to_euros(row.paid_cents),
        last_activity: row.last_activity,
      })
      .collect(),
  ))
}

#[derive(Serialize)]
pub struct UserDetailsResp {
  pub user_profile: partner::Model,
  pub leads: Vec<lead::Model>,
  pub commissions: Vec<commission::Model>,
  pub payments: Vec<payment::Model>,
  pub messages: Vec<message::Model>,
}

pub async fn user_details(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Path(user_id): Path<Uuid>,
) -> Result<Json<UserDetailsResp>> {
  require_admin(&app, &identity)?;

  let details = sv::Partner::new(&app.db).details(user_id).await?;
  Ok(Json(UserDetailsResp {
    user_profile: details.profile,
    leads: details.leads,
    commissions: details.commissions,
    payments: details.payments,
    messages: details.messages,
  }))
}

#[derive(Deserialize)]
pub struct DeleteUserReq {
  pub user_id: Uuid,
  pub confirm_deletion: bool,
}

#[derive(Serialize)]
pub struct DeletedUser {
  pub user_id: Uuid,
  pub full_name: String,
  pub user_type: UserType,
}

#[derive(Serialize)]
pub struct DeleteUserResp {
  pub message: String,
  pub deleted_user: DeletedUser,
}

pub async fn delete_user(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Json(req): Json<DeleteUserReq>,
) -> Result<Json<DeleteUserResp>> {
  require_admin(&app, &identity)?;

  let profile = sv::Partner::new(&app.db)
    .purge(req.user_id, req.confirm_deletion)
    .await?;

  Ok(Json(DeleteUserResp {
    message: format!(
      "Utilisateur {} supprimé avec succès",
      profile.full_name
    ),
    deleted_user: DeletedUser {
      user_id: profile.user_id,
      full_name: profile.full_name,
      user_type: profile.user_type,
    },
  }))
}

// ----- leads -----

#[derive(Serialize)]
pub struct AdminLeadResp {
  #[serde(flatten)]
  pub lead: lead::Model,
  pub apporteur_name: Option<String>,
  pub apporteur_type: Option<UserType>,
}

pub async fn all_leads(
  State(app): State<Arc<AppState>>,
  identity: Identity,
) -> Result<Json<Vec<AdminLeadResp>>> {
  require_admin(&app, &identity)?;

  let rows = sv::Lead::new(&app.db).all_with_partner().await?;
  Ok(Json(
    rows
      .into_iter()
      .map(|(lead, partner)| AdminLeadResp {
        lead,
        apporteur_name: partner.as_ref().map(|p| p.full_name.clone()),
        apporteur_type: partner.as_ref().map(|p| p.user_type),
      })
      .collect(),
  ))
}

#[derive(Deserialize)]
pub struct UpdateLeadStatusReq {
  pub lead_id: i32,
  pub new_status: LeadStatus,
  /// Net sale amount in euros; mandatory when installing a business
  /// partner's lead.
  pub amount_ht: Option<f64>,
}

pub async fn update_lead_status(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Json(req): Json<UpdateLeadStatusReq>,
) -> Result<Json<Status>> {
  require_admin(&app, &identity)?;

  let outcome = sv::Lead::new(&app.db)
    .update_status(
      req.lead_id,
      req.new_status,
      req.amount_ht.map(euros_to_cents),
    )
    .await?;

  let message = match (req.new_status, &outcome.reward) {
    (LeadStatus::Installed, Some(reward))
      if reward.kind == CommissionKind::Commission =>
    {
      format!(
        "Commission de {} (5% de {} HT) créée pour le professionnel",
        format_euros(reward.amount_cents),
        format_euros(reward.amount_ht_cents.unwrap_or(0))
      )
    }
    (LeadStatus::Installed, Some(reward)) => format!(
      "Bon d'achat de {} créé ({}/5 parrainages cette année)",
      format_euros(reward.amount_cents),
      reward.parrainage_count_year.unwrap_or(0)
    ),
    (LeadStatus::Installed, None) => {
      "Statut mis à jour, aucun bon d'achat applicable".into()
    }
    (status, _) => {
      format!("Statut du lead mis à jour vers '{}'", status.as_str())
    }
  };

  Ok(Json(Status { success: true, msg: Some(message) }))
}

// ----- payments -----

#[derive(Deserialize)]
pub struct PaymentRequestsQuery {
  #[serde(default = "default_page")]
  pub page: u64,
  #[serde(default = "default_limit")]
  pub limit: u64,
  #[serde(default)]
  pub status: String,
}

fn default_page() -> u64 {
  1
}

fn default_limit() -> u64 {
  20
}

#[derive(Serialize)]
pub struct PaymentRequestResp {
  pub id: i32,
  pub user_id: Uuid,
  pub apporteur_name: Option<String>,
  pub amount_requested: f64,
  pub status: PaymentStatus,
  pub requested_at: DateTime,
  pub processed_at: Option<DateTime>,
}

#[derive(Serialize)]
pub struct PaymentRequestsResp {
  pub data: Vec<PaymentRequestResp>,
  pub total: u64,
  pub page: u64,
  pub limit: u64,
  pub total_pages: u64,
}

pub async fn payment_requests(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Query(query): Query<PaymentRequestsQuery>,
) -> Result<Json<PaymentRequestsResp>> {
  require_admin(&app, &identity)?;

  let status = match query.status.trim() {
    "" => None,
    "requested" => Some(PaymentStatus::Requested),
    "completed" => Some(PaymentStatus::Completed),
    "rejected" => Some(PaymentStatus::Rejected),
    other => {
      return Err(Error::InvalidArgs(format!(
        "Statut de filtre invalide: {other}"
      )));
    }
  };

  let page = query.page.max(1);
  let limit = query.limit.clamp(1, 100);

  let result = sv::Payment::new(&app.db).page(page, limit, status).await?;

  Ok(Json(PaymentRequestsResp {
    data: result
      .data
      .into_iter()
      .map(|(request, partner)| PaymentRequestResp {
        id: request.id,
        user_id: request.user_id,
        apporteur_name: partner.map(|p| p.full_name),
        amount_requested: cents_to_euros(request.amount_requested_cents),
        status: request.status,
        requested_at: request.requested_at,
        processed_at: request.processed_at,
      })
      .collect(),
    total: result.total,
    page,
    limit,
    total_pages: result.total.div_ceil(limit),
  }))
}

#[derive(Deserialize)]
pub struct ProcessPaymentReq {
  pub payment_id: i32,
  /// 'virement' ou 'bon_dachat'
  pub payment_method: String,
  pub payment_date: Option<DateTime>,
  #[serde(default)]
  pub reject: bool,
}

#[derive(Serialize)]
pub struct ProcessPaymentResp {
  pub message: String,
  pub amount_paid: f64,
  pub payment_method: String,
  pub payment_date: DateTime,
}

pub async fn process_payment(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Json(req): Json<ProcessPaymentReq>,
) -> Result<Json<ProcessPaymentResp>> {
  require_admin(&app, &identity)?;

  let outcome = if req.reject {
    PaymentStatus::Rejected
  } else {
    PaymentStatus::Completed
  };

  let processed = sv::Payment::new(&app.db)
    .process(req.payment_id, outcome, req.payment_date)
    .await?;

  let message = match outcome {
    PaymentStatus::Completed => format!(
      "Paiement traité avec succès par {} ({} commission(s) payée(s))",
      req.payment_method, processed.rewards_paid
    ),
    _ => "Demande de paiement rejetée".into(),
  };

  Ok(Json(ProcessPaymentResp {
    message,
    amount_paid: cents_to_euros(processed.request.amount_requested_cents),
    payment_method: req.payment_method,
    payment_date: processed
      .request
      .processed_at
      .unwrap_or_else(|| Utc::now().naive_utc()),
  }))
}

#[derive(Deserialize)]
pub struct RequestPaymentForUserReq {
  pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct RequestPaymentForUserResp {
  pub success: bool,
  pub amount_requested: f64,
  pub message: String,
}

pub async fn request_payment_for_user(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Json(req): Json<RequestPaymentForUserReq>,
) -> Result<Json<RequestPaymentForUserResp>> {
  require_admin(&app, &identity)?;

  let request = sv::Payment::new(&app.db).request(req.user_id).await?;

  Ok(Json(RequestPaymentForUserResp {
    success: true,
    amount_requested: cents_to_euros(request.amount_requested_cents),
    message: "Demande de paiement envoyée avec succès".into(),
  }))
}

// ----- anniversary alerts -----

#[derive(Serialize)]
pub struct AnniversaryAlertResp {
  pub user_id: Uuid,
  pub full_name: String,
  pub anniversary_date: DateTime,
  pub vouchers_pending: f64,
  pub days_until_anniversary: i64,
  pub passed: bool,
  pub referral_count: u64,
}

pub async fn anniversary_alerts(
  State(app): State<Arc<AppState>>,
  identity: Identity,
) -> Result<Json<Vec<AnniversaryAlertResp>>> {
  require_admin(&app, &identity)?;

  let alerts = sv::Stats::new(&app.db).anniversary_alerts().await?;
  Ok(Json(
    alerts
      .into_iter()
      .map(|alert| AnniversaryAlertResp {
        user_id: alert.user_id,
        full_name: alert.full_name,
        anniversary_date: alert.anniversary_date,
        vouchers_pending: cents_to_euros(alert.vouchers_pending_cents),
        days_until_anniversary: alert.days_until_anniversary,
        passed: alert.passed,
        referral_count: alert.referral_count,
      })
      .collect(),
  ))
}

// ----- messaging -----

#[derive(Deserialize)]
pub struct SendAnnouncementReq {
  pub subject: String,
  pub content: String,
}

pub async fn send_announcement(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Json(req): Json<SendAnnouncementReq>,
) -> Result<Json<Status>> {
  require_admin(&app, &identity)?;

  sv::Message::new(&app.db)
    .send_announcement(identity.id, req.subject, req.content)
    .await?;

  Ok(Json(Status {
    success: true,
    msg: Some("Annonce envoyée avec succès".into()),
  }))
}

#[derive(Deserialize)]
pub struct SendPrivateMessageReq {
  pub user_id: Uuid,
  pub subject: String,
  pub content: String,
}

pub async fn send_private_message(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Json(req): Json<SendPrivateMessageReq>,
) -> Result<Json<Status>> {
  require_admin(&app, &identity)?;

  sv::Message::new(&app.db)
    .send_private_from_admin(
      identity.id,
      req.user_id,
      req.subject,
      req.content,
    )
    .await?;

  Ok(Json(Status {
    success: true,
    msg: Some("Message privé envoyé avec succès".into()),
  }))
}

#[derive(Serialize)]
pub struct ReceivedMessageResp {
  #[serde(flatten)]
  pub message: message::Model,
  pub sender_name: Option<String>,
  pub apporteur_type: Option<UserType>,
}

#[derive(Serialize)]
pub struct ReceivedMessagesResp {
  pub messages: Vec<ReceivedMessageResp>,
}

pub async fn received_messages(
  State(app): State<Arc<AppState>>,
  identity: Identity,
) -> Result<Json<ReceivedMessagesResp>> {
  require_admin(&app, &identity)?;

  let rows = sv::Message::new(&app.db).admin_received(identity.id).await?;
  Ok(Json(ReceivedMessagesResp {
    messages: rows
      .into_iter()
      .map(|(message, sender)| ReceivedMessageResp {
        sender_name: sender.as_ref().map(|p| p.full_name.clone()),
        apporteur_type: sender.as_ref().map(|p| p.user_type),
        message,
      })
      .collect(),
  }))
}
