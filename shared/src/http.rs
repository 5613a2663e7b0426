//! HTTP helpers for Lambda functions.

use lambda_http::{Body, Response};
use serde::Serialize;

use crate::error::WebhookError;
use crate::models::{BookingConfirmation, ErrorBody, WebhookAccepted};

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(data)?))
        .map_err(Box::new)?)
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>, lambda_http::Error> {
    json_response(status, &ErrorBody::new(message))
}

/// 200 response for a booked appointment.
pub fn accepted_response(confirmation: &BookingConfirmation) -> Result<Response<Body>, lambda_http::Error> {
    json_response(
        200,
        &WebhookAccepted {
            message: "Booking event created successfully".to_string(),
            event_id: confirmation.event_id.clone(),
        },
    )
}

/// 400/500 response for a rejected or failed notification.
pub fn webhook_error_response(err: &WebhookError) -> Result<Response<Body>, lambda_http::Error> {
    let mut body = ErrorBody::new(err.to_string());
    match err {
        WebhookError::MissingFields(fields) => {
            body.missing_fields = Some(fields.iter().map(|f| f.to_string()).collect());
        }
        WebhookError::InvalidFields(fields) => {
            body.invalid_fields = Some(fields.iter().map(|f| f.to_string()).collect());
        }
        WebhookError::Upstream(details) => {
            body.details = Some(details.clone());
        }
        _ => {}
    }
    json_response(err.status_code(), &body)
}
