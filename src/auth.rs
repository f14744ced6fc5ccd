//! Identity handling. The identity provider in front of this service
//! authenticates the caller and forwards the claims in signed headers;
//! we verify the HMAC tag with the shared server secret and trust the
//! claims as-is.

use axum::{extract::FromRequestParts, http::request::Parts};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{prelude::*, state::AppState};

type HmacSha256 = Hmac<Sha256>;

pub const ID_HEADER: &str = "x-auth-id";
pub const EMAIL_HEADER: &str = "x-auth-email";
pub const SIGNATURE_HEADER: &str = "x-auth-signature";

#[derive(Debug, Clone)]
pub struct Identity {
  pub id: Uuid,
  pub email: Option<String>,
}

/// The identity provider must supply a canonical stable identifier; any
/// non-UUID subject is rejected outright.
pub fn normalize_identity(raw: &str) -> Result<Uuid> {
  Uuid::parse_str(raw.trim()).map_err(|_| Error::Unauthorized)
}

/// Tag over `"{id}\n{email}"`, hex-encoded.
#[allow(dead_code)]
pub fn sign_identity(secret: &str, id: &str, email: &str) -> String {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .expect("HMAC accepts any key length");
  mac.update(id.as_bytes());
  mac.update(b"\n");
  mac.update(email.as_bytes());
  hex::encode(mac.finalize().into_bytes())
}

pub fn verify_signature(
  secret: &str,
  id: &str,
  email: &str,
  signature: &str,
) -> Result<()> {
  let tag = hex::decode(signature).map_err(|_| Error::Unauthorized)?;
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .expect("HMAC accepts any key length");
  mac.update(id.as_bytes());
  mac.update(b"\n");
  mac.update(email.as_bytes());
  mac.verify_slice(&tag).map_err(|_| Error::Unauthorized)
}

impl FromRequestParts<Arc<AppState>> for Identity {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let header = |name: &str| {
      parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
    };

    let id_raw = header(ID_HEADER).ok_or(Error::Unauthorized)?;
    let email = header(EMAIL_HEADER);
    let signature = header(SIGNATURE_HEADER).ok_or(Error::Unauthorized)?;

    verify_signature(
      &app.secret,
      &id_raw,
      email.as_deref().unwrap_or(""),
      &signature,
    )?;

    Ok(Identity { id: normalize_identity(&id_raw)?, email })
  }
}

pub fn require_admin(app: &AppState, identity: &Identity) -> Result<()> {
  if app.is_admin(identity) { Ok(()) } else { Err(Error::AdminOnly) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_signature_roundtrip() {
    let id = "f47ac10b-58cc-4372-a567-0e02b2c3d479";
    let tag = sign_identity("secret", id, "alice@example.com");
    assert!(verify_signature("secret", id, "alice@example.com", &tag).is_ok());
  }

  #[test]
  fn test_signature_rejects_tampering() {
    let id = "f47ac10b-58cc-4372-a567-0e02b2c3d479";
    let tag = sign_identity("secret", id, "alice@example.com");

    assert!(
      verify_signature("secret", id, "mallory@example.com", &tag).is_err()
    );
    assert!(
      verify_signature("other-secret", id, "alice@example.com", &tag).is_err()
    );
    assert!(verify_signature("secret", id, "alice@example.com", "zz").is_err());
  }

  #[test]
  fn test_normalize_rejects_legacy_ids() {
    assert!(normalize_identity("test-user-id").is_err());
    assert!(
      normalize_identity("f47ac10b-58cc-4372-a567-0e02b2c3d479").is_ok()
    );
  }
}
