//! Shared data models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payment-success notification as posted by the payment gateway.
///
/// Every field is kept as raw JSON; presence and type are checked by the
/// webhook pipeline so that all missing fields can be reported at once.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub payment_status: Option<Value>,
    pub customer_name: Option<Value>,
    pub customer_email: Option<Value>,
    pub customer_phone: Option<Value>,
    pub stylist_id: Option<Value>,
    pub appointment_start_time: Option<Value>,
    pub appointment_end_time: Option<Value>,
    pub service_name: Option<Value>,
}

/// A payload that passed the presence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBooking {
    pub payment_status: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub stylist_id: String,
    pub appointment_start_time: String,
    pub appointment_end_time: String,
    pub service_name: String,
}

/// Start or end of a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// RFC 3339 timestamp with offset
    pub date_time: String,
}

/// Event resource sent to the calendar service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEventRequest {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
}

impl From<&ValidatedBooking> for CalendarEventRequest {
    fn from(booking: &ValidatedBooking) -> Self {
        Self {
            summary: format!("{} - {}", booking.service_name, booking.customer_name),
            description: format!(
                "Customer phone: {}\nCustomer email: {}",
                booking.customer_phone, booking.customer_email
            ),
            start: EventDateTime {
                date_time: booking.appointment_start_time.clone(),
            },
            end: EventDateTime {
                date_time: booking.appointment_end_time.clone(),
            },
        }
    }
}

/// Result of a successfully handled webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfirmation {
    pub event_id: String,
    pub calendar_id: String,
    pub stylist_id: String,
}

/// 200 response body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAccepted {
    pub message: String,
    pub event_id: String,
}

/// 4xx/5xx response body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            missing_fields: None,
            invalid_fields: None,
            details: None,
        }
    }
}
