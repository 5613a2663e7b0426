//! Payment-success webhook pipeline.
//!
//! Presence check → status check → stylist lookup → calendar insert. Each
//! stage short-circuits; only the last one talks to the network.

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::calendar::CalendarService;
use crate::directory::StylistDirectory;
use crate::error::WebhookError;
use crate::models::{BookingConfirmation, CalendarEventRequest, ValidatedBooking, WebhookPayload};

/// Wire names of the fields every notification must carry, in report order.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "paymentStatus",
    "customerName",
    "customerEmail",
    "customerPhone",
    "stylistId",
    "appointmentStartTime",
    "appointmentEndTime",
    "serviceName",
];

/// The only payment status that books an appointment.
pub const PAID_STATUS: &str = "PAID";

impl WebhookPayload {
    /// Decode a request body. An empty body is an empty object.
    pub fn from_body(body: &[u8]) -> Result<Self, WebhookError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| WebhookError::InvalidBody(e.to_string()))
    }

    /// Check that every required field is present and non-empty, then that
    /// each one is a scalar.
    ///
    /// Absent, `null` and `""` count as missing, and every missing field is
    /// reported, not just the first. Numbers and booleans are taken in their
    /// JSON text form; arrays and objects are rejected once presence passes.
    pub fn require_fields(self) -> Result<ValidatedBooking, WebhookError> {
        let mut missing = Vec::new();
        let mut invalid = Vec::new();
        let mut require = |value: Option<Value>, field: &'static str| match value {
            None | Some(Value::Null) => {
                missing.push(field);
                String::new()
            }
            Some(Value::String(text)) if text.is_empty() => {
                missing.push(field);
                String::new()
            }
            Some(Value::String(text)) => text,
            Some(Value::Number(number)) => number.to_string(),
            Some(Value::Bool(flag)) => flag.to_string(),
            Some(Value::Array(_) | Value::Object(_)) => {
                invalid.push(field);
                String::new()
            }
        };

        let booking = ValidatedBooking {
            payment_status: require(self.payment_status, REQUIRED_FIELDS[0]),
            customer_name: require(self.customer_name, REQUIRED_FIELDS[1]),
            customer_email: require(self.customer_email, REQUIRED_FIELDS[2]),
            customer_phone: require(self.customer_phone, REQUIRED_FIELDS[3]),
            stylist_id: require(self.stylist_id, REQUIRED_FIELDS[4]),
            appointment_start_time: require(self.appointment_start_time, REQUIRED_FIELDS[5]),
            appointment_end_time: require(self.appointment_end_time, REQUIRED_FIELDS[6]),
            service_name: require(self.service_name, REQUIRED_FIELDS[7]),
        };

        if !missing.is_empty() {
            Err(WebhookError::MissingFields(missing))
        } else if !invalid.is_empty() {
            Err(WebhookError::InvalidFields(invalid))
        } else {
            Ok(booking)
        }
    }
}

/// Validates notifications and books them into stylist calendars.
#[derive(Clone)]
pub struct PaymentWebhook {
    directory: Arc<StylistDirectory>,
    calendar: Arc<dyn CalendarService>,
}

impl PaymentWebhook {
    pub fn new(directory: Arc<StylistDirectory>, calendar: Arc<dyn CalendarService>) -> Self {
        Self {
            directory,
            calendar,
        }
    }

    /// Run the full pipeline for one notification.
    pub async fn handle(&self, payload: WebhookPayload) -> Result<BookingConfirmation, WebhookError> {
        let booking = payload.require_fields().inspect_err(|e| {
            match e {
                WebhookError::MissingFields(fields) => {
                    warn!(missing_fields = ?fields, "Payment webhook: missing fields")
                }
                WebhookError::InvalidFields(fields) => {
                    warn!(invalid_fields = ?fields, "Payment webhook: non-scalar fields")
                }
                _ => {}
            }
        })?;

        if booking.payment_status != PAID_STATUS {
            warn!(
                "Payment webhook: unexpected paymentStatus {}",
                booking.payment_status
            );
            return Err(WebhookError::UnexpectedStatus(booking.payment_status));
        }

        let Some(calendar_id) = self.directory.calendar_for(&booking.stylist_id) else {
            warn!("Payment webhook: unknown stylistId {}", booking.stylist_id);
            return Err(WebhookError::UnknownStylist(booking.stylist_id));
        };

        let event = CalendarEventRequest::from(&booking);
        let event_id = match self.calendar.insert_event(calendar_id, &event).await {
            Ok(id) => id,
            Err(e) => {
                error!(
                    "Failed to create calendar event for stylist {}: {}",
                    booking.stylist_id, e
                );
                return Err(e.into());
            }
        };

        info!(
            "Calendar event created: {} for stylist {}",
            event_id, booking.stylist_id
        );

        Ok(BookingConfirmation {
            event_id,
            calendar_id: calendar_id.to_string(),
            stylist_id: booking.stylist_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records inserts and answers with a canned result.
    struct FakeCalendar {
        result: std::result::Result<String, String>,
        calls: Mutex<Vec<(String, CalendarEventRequest)>>,
    }

    impl FakeCalendar {
        fn returning(id: &str) -> Self {
            Self {
                result: Ok(id.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                result: Err(message.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CalendarService for FakeCalendar {
        async fn insert_event(&self, calendar_id: &str, event: &CalendarEventRequest) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((calendar_id.to_string(), event.clone()));
            self.result.clone().map_err(Error::Upstream)
        }
    }

    fn valid_payload() -> WebhookPayload {
        serde_json::from_value(serde_json::json!({
            "paymentStatus": "PAID",
            "customerName": "Test Customer",
            "customerEmail": "test@example.com",
            "customerPhone": "+97699112233",
            "stylistId": "stylist_anand",
            "appointmentStartTime": "2026-03-01T10:00:00+08:00",
            "appointmentEndTime": "2026-03-01T11:00:00+08:00",
            "serviceName": "Haircut"
        }))
        .unwrap()
    }

    fn webhook(calendar: Arc<FakeCalendar>) -> PaymentWebhook {
        let directory = StylistDirectory::new([
            ("stylist_anand", "Matrixanand4@gmail.com"),
            ("stylist_tergel", "matrixtergel@gmail.com"),
        ])
        .unwrap();
        PaymentWebhook::new(Arc::new(directory), calendar)
    }

    #[test]
    fn test_empty_body_reports_every_field() {
        let payload = WebhookPayload::from_body(b"").unwrap();
        match payload.require_fields() {
            Err(WebhookError::MissingFields(fields)) => assert_eq!(fields, REQUIRED_FIELDS.to_vec()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_fields_are_exactly_the_absent_ones() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "paymentStatus": "PAID",
            "customerName": "",
            "customerEmail": null,
            "customerPhone": "+97699112233",
            "stylistId": "stylist_anand",
            "appointmentEndTime": "2026-03-01T11:00:00+08:00",
            "serviceName": "Haircut"
        }))
        .unwrap();

        match payload.require_fields() {
            Err(WebhookError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["customerName", "customerEmail", "appointmentStartTime"])
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_whitespace_counts_as_present() {
        let mut payload = valid_payload();
        payload.customer_phone = Some(Value::from(" "));
        assert!(payload.require_fields().is_ok());
    }

    #[test]
    fn test_numeric_field_does_not_hide_missing_ones() {
        let payload =
            WebhookPayload::from_body(br#"{"paymentStatus":"PAID","customerPhone":97699112233}"#).unwrap();

        match payload.require_fields() {
            Err(WebhookError::MissingFields(fields)) => assert_eq!(
                fields,
                vec![
                    "customerName",
                    "customerEmail",
                    "stylistId",
                    "appointmentStartTime",
                    "appointmentEndTime",
                    "serviceName"
                ]
            ),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_numeric_phone_is_booked_as_text() {
        let mut payload = valid_payload();
        payload.customer_phone = Some(serde_json::json!(97699112233u64));

        let booking = payload.require_fields().unwrap();
        assert_eq!(booking.customer_phone, "97699112233");
    }

    #[test]
    fn test_structured_values_rejected_after_presence() {
        let mut payload = valid_payload();
        payload.stylist_id = Some(serde_json::json!({"name": "stylist_anand"}));
        payload.service_name = Some(serde_json::json!(["Haircut"]));

        match payload.require_fields() {
            Err(WebhookError::InvalidFields(fields)) => {
                assert_eq!(fields, vec!["stylistId", "serviceName"])
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_non_object_body_is_invalid() {
        let err = WebhookPayload::from_body(b"not json").unwrap_err();
        assert!(matches!(err, WebhookError::InvalidBody(_)));

        let err = WebhookPayload::from_body(b"[1, 2]").unwrap_err();
        assert!(matches!(err, WebhookError::InvalidBody(_)));
    }

    #[tokio::test]
    async fn test_pending_status_rejected_before_lookup() {
        let calendar = Arc::new(FakeCalendar::returning("unused"));
        let mut payload = valid_payload();
        payload.payment_status = Some(Value::from("PENDING"));

        let err = webhook(calendar.clone()).handle(payload).await.unwrap_err();
        assert!(matches!(err, WebhookError::UnexpectedStatus(ref s) if s == "PENDING"));
        assert!(err.to_string().contains("PAID"));
        assert!(calendar.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_is_case_sensitive() {
        let calendar = Arc::new(FakeCalendar::returning("unused"));
        let mut payload = valid_payload();
        payload.payment_status = Some(Value::from("paid"));

        let err = webhook(calendar).handle(payload).await.unwrap_err();
        assert!(matches!(err, WebhookError::UnexpectedStatus(_)));
    }

    #[tokio::test]
    async fn test_unknown_stylist_rejected() {
        let calendar = Arc::new(FakeCalendar::returning("unused"));
        let mut payload = valid_payload();
        payload.stylist_id = Some(Value::from("Ananda"));

        let err = webhook(calendar.clone()).handle(payload).await.unwrap_err();
        assert!(err.is_bad_payload());
        let message = err.to_string();
        assert!(message.contains("stylistId"));
        assert!(message.contains("Ananda"));
        assert!(calendar.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_valid_payload_books_event() {
        let calendar = Arc::new(FakeCalendar::returning("event_abc123"));

        let confirmation = webhook(calendar.clone()).handle(valid_payload()).await.unwrap();
        assert_eq!(confirmation.event_id, "event_abc123");
        assert_eq!(confirmation.calendar_id, "Matrixanand4@gmail.com");
        assert_eq!(confirmation.stylist_id, "stylist_anand");

        let calls = calendar.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (calendar_id, event) = &calls[0];
        assert_eq!(calendar_id, "Matrixanand4@gmail.com");
        assert_eq!(event.summary, "Haircut - Test Customer");
        assert_eq!(event.start.date_time, "2026-03-01T10:00:00+08:00");
    }

    #[tokio::test]
    async fn test_remote_failure_is_upstream_error() {
        let calendar = Arc::new(FakeCalendar::failing("Google API error"));

        let err = webhook(calendar).handle(valid_payload()).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        match err {
            WebhookError::Upstream(details) => assert!(details.contains("Google API error")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
