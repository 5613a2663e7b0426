//! Shared library for the Matrix Salon Lambda functions.
//!
//! This crate provides the payment webhook pipeline and the clients and
//! configuration it runs on.

pub mod calendar;
pub mod config;
pub mod credentials;
pub mod directory;
pub mod error;
pub mod http;
pub mod models;
pub mod secrets;
pub mod webhook;

pub use calendar::{CalendarService, GoogleCalendarClient};
pub use config::{Config, CredentialSource};
pub use credentials::{CredentialStore, TokenProvider};
pub use directory::StylistDirectory;
pub use error::{Error, Result, WebhookError};
pub use models::{BookingConfirmation, CalendarEventRequest, WebhookPayload};
pub use webhook::{PaymentWebhook, PAID_STATUS, REQUIRED_FIELDS};
