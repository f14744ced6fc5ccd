//! Partner-facing handlers: thin request/response mapping around the
//! service layer. Amounts cross the API as euros, the services work in
//! cents.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
  auth::Identity,
  entity::{CommissionStatus, UserType, lead, message, partner},
  prelude::*,
  state::AppState,
  sv,
  utils::{cents_to_euros, format_euros},
};

#[derive(Serialize)]
pub struct Status {
  pub success: bool,
  pub msg: Option<String>,
}

impl Status {
  fn ok(msg: impl Into<String>) -> Json<Self> {
    Json(Self { success: true, msg: Some(msg.into()) })
  }
}

pub async fn health() -> Json<Status> {
  Json(Status { success: true, msg: None })
}

// ----- profile -----

#[derive(Deserialize)]
pub struct CreateProfileReq {
  pub full_name: String,
  pub user_type: UserType,
  pub phone: String,
  pub email: String,
  #[serde(default = "default_city")]
  pub city: String,
  pub siret: Option<String>,
  pub gdpr_consent: bool,
}

fn default_city() -> String {
  "Non renseigné".into()
}

#[derive(Serialize)]
pub struct CreateProfileResp {
  pub success: bool,
  pub message: String,
  pub user_id: Uuid,
}

pub async fn create_profile(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Json(req): Json<CreateProfileReq>,
) -> Result<(StatusCode, Json<CreateProfileResp>)> {
  let profile = sv::Partner::new(&app.db)
    .create(
      identity.id,
      sv::partner::NewProfile {
        full_name: req.full_name,
        user_type: req.user_type,
        phone: req.phone,
        email: req.email,
        city: req.city,
        siret: req.siret,
        gdpr_consent: req.gdpr_consent,
      },
    )
    .await?;

  Ok((
    StatusCode::CREATED,
    Json(CreateProfileResp {
      success: true,
      message: "Profil créé avec succès".into(),
      user_id: profile.user_id,
    }),
  ))
}

#[derive(Serialize)]
pub struct ProfileCheckResp {
  pub is_complete: bool,
  pub missing_fields: Vec<String>,
  pub user_profile: Option<partner::Model>,
}

pub async fn check_profile(
  State(app): State<Arc<AppState>>,
  identity: Identity,
) -> Result<Json<ProfileCheckResp>> {
  let check = sv::Partner::new(&app.db).check(identity.id).await?;

  Ok(Json(ProfileCheckResp {
    is_complete: check.is_complete,
    missing_fields: check.missing_fields,
    user_profile: check.profile,
  }))
}

// ----- dashboard -----

#[derive(Serialize)]
pub struct DashboardStats {
  pub total_leads: u64,
  pub leads_submitted: u64,
  pub leads_visited: u64,
  pub leads_signed: u64,
  pub leads_installed: u64,
}

#[derive(Serialize)]
pub struct DashboardResp {
  pub user_profile: partner::Model,
  pub stats: DashboardStats,
  pub commission_balance: f64,
  pub recent_leads: Vec<lead::Model>,
}

pub async fn dashboard(
  State(app): State<Arc<AppState>>,
  identity: Identity,
) -> Result<Json<DashboardResp>> {
  let dashboard = sv::Stats::new(&app.db).dashboard(identity.id).await?;

  Ok(Json(DashboardResp {
    user_profile: dashboard.profile,
    stats: DashboardStats {
      total_leads: dashboard.total_leads,
      leads_submitted: dashboard.leads_submitted,
      leads_visited: dashboard.leads_visited,
      leads_signed: dashboard.leads_signed,
      leads_installed: dashboard.leads_installed,
    },
    commission_balance: cents_to_euros(dashboard.commission_balance_cents),
    recent_leads: dashboard.recent_leads,
  }))
}

// ----- leads -----

#[derive(Deserialize)]
pub struct CreateLeadReq {
  pub prospect_name: String,
  pub prospect_phone: String,
  pub prospect_email: String,
  pub prospect_city: Option<String>,
  pub notes: Option<String>,
}

pub async fn submit_lead(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Json(req): Json<CreateLeadReq>,
) -> Result<(StatusCode, Json<Status>)> {
  sv::Lead::new(&app.db)
    .submit(
      identity.id,
      sv::lead::NewLead {
        prospect_name: req.prospect_name,
        prospect_phone: req.prospect_phone,
        prospect_email: req.prospect_email,
        prospect_city: req.prospect_city,
        notes: req.notes,
      },
    )
    .await?;

  Ok((StatusCode::CREATED, Status::ok("Lead soumis avec succès")))
}

#[derive(Serialize)]
pub struct LeadDetails {
  #[serde(flatten)]
  pub lead: lead::Model,
  pub commission_status: Option<CommissionStatus>,
}

pub async fn my_leads(
  State(app): State<Arc<AppState>>,
  identity: Identity,
) -> Result<Json<Vec<LeadDetails>>> {
  let leads = sv::Lead::new(&app.db).for_partner(identity.id).await?;

  Ok(Json(
    leads
      .into_iter()
      .map(|(lead, commission)| LeadDetails {
        lead,
        commission_status: commission.map(|c| c.status),
      })
      .collect(),
  ))
}

// ----- commissions -----

#[derive(Serialize)]
pub struct BalanceResp {
  pub due_balance: f64,
}

pub async fn commission_balance(
  State(app): State<Arc<AppState>>,
  identity: Identity,
) -> Result<Json<BalanceResp>> {
  let balance =
    sv::Ledger::new(&app.db).pending_balance(identity.id).await?;

  Ok(Json(BalanceResp { due_balance: cents_to_euros(balance) }))
}

pub async fn request_payment(
  State(app): State<Arc<AppState>>,
  identity: Identity,
) -> Result<StatusCode> {
  let profile = sv::Partner::new(&app.db).get(identity.id).await?;
  let request = sv::Payment::new(&app.db).request(identity.id).await?;

  app.notify.send_admin(
    "Parrainage: nouvelle demande de paiement",
    &format!(
      "{} a demandé le paiement de {}",
      profile.full_name,
      format_euros(request.amount_requested_cents)
    ),
  );

  Ok(StatusCode::NO_CONTENT)
}

// ----- messaging -----

#[derive(Serialize)]
pub struct AnnouncementItem {
  #[serde(flatten)]
  pub message: message::Model,
  pub is_read: bool,
}

#[derive(Serialize)]
pub struct MessagesResp {
  pub announcements: Vec<AnnouncementItem>,
  pub private_messages: Vec<message::Model>,
  pub unread_count: u64,
}

pub async fn my_messages(
  State(app): State<Arc<AppState>>,
  identity: Identity,
) -> Result<Json<MessagesResp>> {
  let inbox = sv::Message::new(&app.db).inbox(identity.id).await?;

  Ok(Json(MessagesResp {
    announcements: inbox
      .announcements
      .into_iter()
      .map(|view| AnnouncementItem {
        message: view.message,
        is_read: view.is_read,
      })
      .collect(),
    private_messages: inbox.private_messages,
    unread_count: inbox.unread_count,
  }))
}

#[derive(Deserialize)]
pub struct MarkAsReadReq {
  pub message_id: i32,
}

pub async fn mark_announcement_read(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Json(req): Json<MarkAsReadReq>,
) -> Result<Json<Status>> {
  sv::Message::new(&app.db)
    .mark_announcement_read(identity.id, req.message_id)
    .await?;

  Ok(Status::ok("Annonce marquée comme lue"))
}

pub async fn mark_private_message_read(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Json(req): Json<MarkAsReadReq>,
) -> Result<Json<Status>> {
  sv::Message::new(&app.db)
    .mark_private_read(identity.id, req.message_id)
    .await?;

  Ok(Status::ok("Message marqué comme lu"))
}

#[derive(Deserialize)]
pub struct SendPrivateMessageReq {
  pub recipient_id: Uuid,
  pub subject: String,
  pub content: String,
}

pub async fn send_private_message(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Json(req): Json<SendPrivateMessageReq>,
) -> Result<Json<Status>> {
  sv::Message::new(&app.db)
    .send_private_from_partner(
      identity.id,
      req.recipient_id,
      req.subject,
      req.content,
    )
    .await?;

  Ok(Status::ok("Message envoyé à l'administrateur"))
}

#[derive(Deserialize)]
pub struct DeleteMessageReq {
  pub message_id: i32,
}

pub async fn delete_message_for_user(
  State(app): State<Arc<AppState>>,
  identity: Identity,
  Json(req): Json<DeleteMessageReq>,
) -> Result<Json<Status>> {
  sv::Message::new(&app.db)
    .delete_for_user(identity.id, req.message_id)
    .await?;

  Ok(Status::ok("Message supprimé avec succès"))
}
