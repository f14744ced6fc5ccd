//! Fire-and-forget email relay. Delivery runs on a detached task; failures
//! are logged and never bubble into the business transaction that
//! triggered them.

use crate::prelude::*;

#[derive(Clone)]
pub struct Notifier {
  client: reqwest::Client,
  endpoint: Option<String>,
  token: Option<String>,
  admin_email: Option<String>,
}

impl Notifier {
  pub fn from_env() -> Self {
    Self {
      client: reqwest::Client::new(),
      endpoint: std::env::var("NOTIFY_URL").ok(),
      token: std::env::var("NOTIFY_TOKEN").ok(),
      admin_email: std::env::var("ADMIN_EMAIL").ok(),
    }
  }

  pub fn send(&self, to: &str, subject: &str, text: &str) {
    let Some(endpoint) = self.endpoint.clone() else {
      debug!("notifier disabled, dropping mail `{subject}`");
      return;
    };

    let client = self.client.clone();
    let token = self.token.clone();
    let payload =
      json::json!({ "to": to, "subject": subject, "text": text });
    let subject = subject.to_string();

    tokio::spawn(async move {
      let mut request = client.post(&endpoint).json(&payload);
      if let Some(token) = token {
        request = request.bearer_auth(token);
      }

      match request.send().await {
        Ok(resp) if resp.status().is_success() => {
          trace!("mail `{subject}` delivered")
        }
        Ok(resp) => warn!("mail `{subject}` rejected: {}", resp.status()),
        Err(err) => warn!("mail `{subject}` failed: {err}"),
      }
    });
  }

  pub fn send_admin(&self, subject: &str, text: &str) {
    match self.admin_email.clone() {
      Some(admin) => self.send(&admin, subject, text),
      None => debug!("no ADMIN_EMAIL configured, dropping `{subject}`"),
    }
  }
}
