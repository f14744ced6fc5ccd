mod admin;
mod handlers;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use axum::{
  Router,
  routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();

    tokio::spawn(async move {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        governor_limiter.retain_recent();
      }
    });

    let router = Router::new()
      .route("/health", get(handlers::health))
      // partner surface
      .route("/api/users/profile", post(handlers::create_profile))
      .route("/api/users/profile/check", get(handlers::check_profile))
      .route("/api/dashboard/data", get(handlers::dashboard))
      .route("/api/leads/submit", post(handlers::submit_lead))
      .route("/api/leads", get(handlers::my_leads))
      .route("/api/commissions/balance", get(handlers::commission_balance))
      .route(
        "/api/commissions/request-payment",
        post(handlers::request_payment),
      )
      .route("/api/messaging/my-messages", get(handlers::my_messages))
      .route(
        "/api/messaging/mark-announcement-read",
        post(handlers::mark_announcement_read),
      )
      .route(
        "/api/messaging/mark-private-message-read",
        post(handlers::mark_private_message_read),
      )
      .route(
        "/api/messaging/send-private-message",
        post(handlers::send_private_message),
      )
      .route(
        "/api/messaging/delete-for-user",
        delete(handlers::delete_message_for_user),
      )
      // admin surface
      .route("/api/admin/stats", get(admin::stats))
      .route("/api/admin/users-with-stats", get(admin::users_with_stats))
      .route("/api/admin/user-details/{user_id}", get(admin::user_details))
      .route("/api/admin/delete-user", delete(admin::delete_user))
      .route("/api/admin/all-leads", get(admin::all_leads))
      .route("/api/admin/update-lead-status", put(admin::update_lead_status))
      .route("/api/admin/payment-requests", get(admin::payment_requests))
      .route("/api/admin/process-payment", post(admin::process_payment))
      .route(
        "/api/admin/anniversary-alerts",
        get(admin::anniversary_alerts),
      )
      .route("/api/admin/send-announcement", post(admin::send_announcement))
      .route(
        "/api/admin/send-private-message",
        post(admin::send_private_message),
      )
      .route("/api/admin/messages/received", get(admin::received_messages))
      .route(
        "/api/admin/request-payment-for-user",
        post(admin::request_payment_for_user),
      )
      .layer(
        ServiceBuilder::new()
          .layer(TraceLayer::new_for_http())
          .layer(GovernorLayer::new(governor_conf))
          .layer(
            CorsLayer::new()
              .allow_origin(Any)
              .allow_methods(Any)
              .allow_headers(Any),
          ),
      )
      .with_state(app)
      .into_make_service_with_connect_info::<SocketAddr>();

    let port: u16 =
      std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server listening on {addr}");

    tokio::spawn(async move {
      let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
      axum::serve(listener, router).await.expect("Server error");
    });

    Ok(())
  }
}
