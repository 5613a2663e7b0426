//! Payment Webhook Lambda - Handles /api/webhooks/payment-success.
//!
//! Receives payment-success notifications from the payment gateway (QPay) and
//! books the paid appointment into the stylist's Google Calendar.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::{accepted_response, error_response, webhook_error_response};
use shared::{
    Config, CredentialStore, GoogleCalendarClient, PaymentWebhook, StylistDirectory, TokenProvider,
    WebhookPayload,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PAYMENT_SUCCESS_PATH: &str = "/api/webhooks/payment-success";

/// Application state shared across requests.
struct AppState {
    webhook: PaymentWebhook,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;

        let directory = StylistDirectory::load(&config.stylist_directory_path).await?;
        info!(
            "Loaded {} stylist calendars from {}",
            directory.len(),
            config.stylist_directory_path.display()
        );

        let http_client = reqwest::Client::new();
        let store = CredentialStore::from_source(&config.credentials).await;
        let tokens = Arc::new(TokenProvider::new(store, http_client.clone()));
        let calendar = GoogleCalendarClient::new(http_client, tokens, config.calendar_api_base);

        Ok(Self {
            webhook: PaymentWebhook::new(Arc::new(directory), Arc::new(calendar)),
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let path = event.uri().path().trim_end_matches('/');
    let method = event.method().as_str();

    match (method, path) {
        ("POST", PAYMENT_SUCCESS_PATH) => payment_success(&state.webhook, event.body()).await,
        _ => {
            warn!("No route for {} {}", method, path);
            error_response(404, "Not found")
        }
    }
}

async fn payment_success(webhook: &PaymentWebhook, body: &Body) -> Result<Response<Body>, Error> {
    let payload = match WebhookPayload::from_body(body.as_ref()) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Payment webhook: {}", e);
            return webhook_error_response(&e);
        }
    };

    match webhook.handle(payload).await {
        Ok(confirmation) => accepted_response(&confirmation),
        Err(e) => webhook_error_response(&e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
