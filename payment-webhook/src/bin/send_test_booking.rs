//! Manual check for a running payment webhook.
//!
//! Posts a paid booking for a sample customer and prints the webhook's answer.
//! `WEBHOOK_URL` overrides the target (defaults to a local `cargo lambda watch`),
//! `STYLIST_ID` overrides the stylist.

use serde_json::{json, Value};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_WEBHOOK_URL: &str = "http://localhost:9000/api/webhooks/payment-success";

fn sample_payload(stylist_id: &str) -> Value {
    json!({
        "paymentStatus": "PAID",
        "stylistId": stylist_id,
        "serviceName": "Haircut",
        "customerName": "Test Customer",
        "customerPhone": "+97699112233",
        "customerEmail": "testcustomer@example.com",
        "appointmentStartTime": "2026-03-05T10:00:00+08:00",
        "appointmentEndTime": "2026-03-05T11:00:00+08:00",
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let url = std::env::var("WEBHOOK_URL").unwrap_or_else(|_| DEFAULT_WEBHOOK_URL.to_string());
    let stylist_id = std::env::var("STYLIST_ID").unwrap_or_else(|_| "stylist_anand".to_string());

    info!("Posting test booking for {} to {}", stylist_id, url);

    let response = match reqwest::Client::new()
        .post(&url)
        .json(&sample_payload(&stylist_id))
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!("Request failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let pretty = serde_json::from_str::<Value>(&body)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or(body);

    if status.is_success() {
        info!("Booking triggered successfully ({})\n{}", status, pretty);
        ExitCode::SUCCESS
    } else {
        error!("Webhook returned an error ({})\n{}", status, pretty);
        ExitCode::FAILURE
    }
}
