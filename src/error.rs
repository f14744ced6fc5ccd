use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::utils::format_date;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Db(#[from] sea_orm::DbErr),
  #[error("partner profile not found")]
  PartnerNotFound,
  #[error("lead not found")]
  LeadNotFound,
  #[error("payment request not found or already processed")]
  PaymentNotFound,
  #[error("message not found")]
  MessageNotFound,
  #[error("profile already exists")]
  ProfileExists,
  #[error("invalid request: {0}")]
  InvalidArgs(String),
  #[error("annual referral cap reached until {next_start}")]
  AnnualCapReached { next_start: NaiveDateTime },
  #[error("no pending rewards")]
  NoPendingRewards,
  #[error("missing or invalid identity")]
  Unauthorized,
  #[error("admin access required")]
  AdminOnly,
  #[error("not allowed")]
  Forbidden,
  #[error("internal error: {0}")]
  Internal(String),
}

#[derive(Serialize)]
struct Body {
  success: bool,
  msg: Option<String>,
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, msg) = match &self {
      // Storage failures are logged in full and kept opaque to callers.
      Error::Db(err) => {
        tracing::error!("database error: {err}");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "Erreur de base de données".to_string(),
        )
      }
      Error::Internal(err) => {
        tracing::error!("internal error: {err}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Erreur inattendue".into())
      }
      Error::PartnerNotFound => {
        (StatusCode::NOT_FOUND, "Profil utilisateur introuvable".into())
      }
      Error::LeadNotFound => {
        (StatusCode::NOT_FOUND, "Lead introuvable".into())
      }
      Error::PaymentNotFound => (
        StatusCode::NOT_FOUND,
        "Demande de paiement introuvable ou déjà traitée".into(),
      ),
      Error::MessageNotFound => {
        (StatusCode::NOT_FOUND, "Message introuvable".into())
      }
      Error::ProfileExists => (
        StatusCode::CONFLICT,
        "Un profil existe déjà pour cet utilisateur".into(),
      ),
      Error::InvalidArgs(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
      Error::AnnualCapReached { next_start } => (
        StatusCode::BAD_REQUEST,
        format!(
          "Limite annuelle atteinte (5/5). Prochains parrainages possibles \
           après le {}",
          format_date(*next_start)
        ),
      ),
      Error::NoPendingRewards => (
        StatusCode::BAD_REQUEST,
        "Aucune commission en attente pour cet apporteur".into(),
      ),
      Error::Unauthorized => {
        (StatusCode::UNAUTHORIZED, "Identité invalide".into())
      }
      Error::AdminOnly => (
        StatusCode::FORBIDDEN,
        "Accès restreint aux administrateurs".into(),
      ),
      Error::Forbidden => (StatusCode::FORBIDDEN, "Non autorisé".into()),
    };

    (status, Json(Body { success: false, msg: Some(msg) })).into_response()
  }
}
