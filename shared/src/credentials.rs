//! Google OAuth credentials and access-token caching.
//!
//! The client credentials and the previously issued token are produced by an
//! out-of-band consent flow. This module only reads them, refreshes the access
//! token when it has expired, and caches the result until told otherwise.

use std::path::{Path, PathBuf};

use aws_sdk_secretsmanager::Client as SecretsClient;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::CredentialSource;
use crate::secrets::SecretCache;
use crate::{Error, Result};

/// Google's OAuth token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring within this window are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth client registration (`credentials.json`).
///
/// Only what the refresh grant needs is decoded; `redirect_uris` and the other
/// consent-flow fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// Google wraps the registration in either `installed` or `web`.
#[derive(Debug, Deserialize)]
struct CredentialsDocument {
    installed: Option<OAuthClientCredentials>,
    web: Option<OAuthClientCredentials>,
}

impl OAuthClientCredentials {
    pub fn from_json(json: &str) -> Result<Self> {
        let document: CredentialsDocument = serde_json::from_str(json)
            .map_err(|e| Error::Credentials(format!("Failed to parse client credentials: {}", e)))?;

        document
            .installed
            .or(document.web)
            .ok_or_else(|| {
                Error::Credentials(
                    "Client credentials have neither an \"installed\" nor a \"web\" section"
                        .to_string(),
                )
            })
    }
}

/// Previously issued token (`token.json`). `token_type` and `scope` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredToken {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Expiry in epoch milliseconds
    pub expiry_date: Option<i64>,
}

impl StoredToken {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Credentials(format!("Failed to parse stored token: {}", e)))
    }

    fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// The stored access token, if it is still usable at `now`.
    fn usable_access_token(&self, now: DateTime<Utc>) -> Option<AccessToken> {
        let token = self.access_token.as_deref().filter(|t| !t.is_empty())?;
        let expires_at = match self.expiry_date {
            Some(ms) => Some(Utc.timestamp_millis_opt(ms).single()?),
            None => None,
        };

        let access = AccessToken {
            token: token.to_string(),
            expires_at,
        };
        access.is_fresh(now).then_some(access)
    }
}

/// A bearer token ready to be sent to the calendar API.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - Duration::seconds(EXPIRY_SKEW_SECS) > now,
            None => true,
        }
    }
}

/// Google token endpoint response to a refresh grant.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Where credentials are read from, with any client needed to read them.
#[derive(Debug)]
pub enum CredentialStore {
    Files {
        credentials_path: PathBuf,
        token_path: PathBuf,
    },
    SecretsManager {
        secrets: SecretCache,
        oauth_secret_arn: String,
        token_secret_arn: String,
    },
}

impl CredentialStore {
    /// Build the store for a configured source, loading AWS config only when needed.
    pub async fn from_source(source: &CredentialSource) -> Self {
        match source {
            CredentialSource::Files {
                credentials_path,
                token_path,
            } => CredentialStore::Files {
                credentials_path: credentials_path.clone(),
                token_path: token_path.clone(),
            },
            CredentialSource::SecretsManager {
                oauth_secret_arn,
                token_secret_arn,
            } => {
                let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                CredentialStore::SecretsManager {
                    secrets: SecretCache::new(SecretsClient::new(&config)),
                    oauth_secret_arn: oauth_secret_arn.clone(),
                    token_secret_arn: token_secret_arn.clone(),
                }
            }
        }
    }

    async fn read(&self) -> Result<(OAuthClientCredentials, StoredToken)> {
        match self {
            CredentialStore::Files {
                credentials_path,
                token_path,
            } => {
                let credentials = read_file(credentials_path).await?;
                let token = read_file(token_path).await?;
                Ok((
                    OAuthClientCredentials::from_json(&credentials)?,
                    StoredToken::from_json(&token)?,
                ))
            }
            CredentialStore::SecretsManager {
                secrets,
                oauth_secret_arn,
                token_secret_arn,
            } => {
                let credentials = secrets.get(oauth_secret_arn).await?;
                let token = secrets.get_json(token_secret_arn).await?;
                Ok((OAuthClientCredentials::from_json(&credentials)?, token))
            }
        }
    }

    async fn forget(&self) {
        if let CredentialStore::SecretsManager { secrets, .. } = self {
            secrets.clear().await;
        }
    }
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Credentials(format!("Failed to read {}: {}", path.display(), e)))
}

#[derive(Debug, Default)]
struct TokenCache {
    token: Option<AccessToken>,
    /// The calendar API turned the last token away.
    rejected: bool,
}

impl TokenCache {
    fn fresh(&self, now: DateTime<Utc>) -> Option<String> {
        self.token
            .as_ref()
            .filter(|t| t.is_fresh(now))
            .map(|t| t.token.clone())
    }
}

/// Lazily loads credentials and hands out a valid access token.
pub struct TokenProvider {
    store: CredentialStore,
    http_client: reqwest::Client,
    cache: RwLock<TokenCache>,
}

impl TokenProvider {
    pub fn new(store: CredentialStore, http_client: reqwest::Client) -> Self {
        Self {
            store,
            http_client,
            cache: RwLock::new(TokenCache::default()),
        }
    }

    /// Return a usable access token, reading and refreshing as needed.
    ///
    /// After [`invalidate`](Self::invalidate) the stored access token is only
    /// reused when there is no refresh token to replace it with.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cache.read().await.fresh(Utc::now()) {
            return Ok(token);
        }

        let mut cache = self.cache.write().await;
        let now = Utc::now();
        // Another request may have refreshed while we waited for the lock.
        if let Some(token) = cache.fresh(now) {
            return Ok(token);
        }

        let (credentials, stored) = self.store.read().await?;
        let stored_token = if cache.rejected && stored.has_refresh_token() {
            None
        } else {
            stored.usable_access_token(now)
        };
        let token = match stored_token {
            Some(token) => {
                debug!("Using stored access token");
                token
            }
            None => self.refresh(&credentials, &stored, now).await?,
        };

        let value = token.token.clone();
        cache.token = Some(token);
        cache.rejected = false;
        Ok(value)
    }

    /// Forget the cached token after the calendar API rejected it.
    ///
    /// The next call re-reads the store and refreshes when it can.
    pub async fn invalidate(&self) {
        {
            let mut cache = self.cache.write().await;
            cache.token = None;
            cache.rejected = true;
        }
        self.store.forget().await;
    }

    async fn refresh(
        &self,
        credentials: &OAuthClientCredentials,
        stored: &StoredToken,
        now: DateTime<Utc>,
    ) -> Result<AccessToken> {
        let refresh_token = stored
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::Credentials(
                    "Stored access token is expired and no refresh token is available".to_string(),
                )
            })?;

        let params = [
            ("refresh_token", refresh_token),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Credentials(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Credentials(format!(
                "Token refresh failed ({}): {}",
                status, error_text
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| Error::Credentials(format!("Failed to parse token response: {}", e)))?;

        info!("Refreshed Google access token");

        Ok(AccessToken {
            token: refreshed.access_token,
            expires_at: refreshed.expires_in.map(|secs| now + Duration::seconds(secs)),
        })
    }
}
