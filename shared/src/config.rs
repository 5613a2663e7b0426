//! Configuration management for the webhook function.

use std::env;
use std::path::PathBuf;

use crate::{Error, Result};

/// Default Google Calendar v3 API root.
pub const DEFAULT_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Where the OAuth client credentials and stored token live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Google-style `credentials.json` / `token.json` files.
    Files {
        credentials_path: PathBuf,
        token_path: PathBuf,
    },
    /// Two Secrets Manager secrets holding the same JSON documents.
    SecretsManager {
        oauth_secret_arn: String,
        token_secret_arn: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON file mapping stylist ids to calendar ids
    pub stylist_directory_path: PathBuf,
    /// OAuth credential location
    pub credentials: CredentialSource,
    /// Google Calendar API root
    pub calendar_api_base: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials = match (var("GOOGLE_OAUTH_SECRET_ARN"), var("GOOGLE_TOKEN_SECRET_ARN")) {
            (Some(oauth_secret_arn), Some(token_secret_arn)) => CredentialSource::SecretsManager {
                oauth_secret_arn,
                token_secret_arn,
            },
            (None, None) => CredentialSource::Files {
                credentials_path: var("GOOGLE_CREDENTIALS_PATH")
                    .unwrap_or_else(|| "credentials.json".to_string())
                    .into(),
                token_path: var("GOOGLE_TOKEN_PATH")
                    .unwrap_or_else(|| "token.json".to_string())
                    .into(),
            },
            _ => {
                return Err(Error::Config(
                    "GOOGLE_OAUTH_SECRET_ARN and GOOGLE_TOKEN_SECRET_ARN must be set together"
                        .to_string(),
                ))
            }
        };

        Ok(Self {
            stylist_directory_path: var("STYLIST_DIRECTORY_PATH")
                .unwrap_or_else(|| "stylists.json".to_string())
                .into(),
            credentials,
            calendar_api_base: var("GOOGLE_CALENDAR_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_CALENDAR_API_BASE.to_string()),
        })
    }
}
