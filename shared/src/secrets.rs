//! AWS Secrets Manager access for the OAuth artifacts.
//!
//! Each credential store owns its own cache, so clearing it after a rejected
//! token only affects that store.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{Error, Result};

/// Secret strings keyed by ARN, fetched on first use.
#[derive(Debug)]
pub struct SecretCache {
    client: SecretsClient,
    values: RwLock<HashMap<String, String>>,
}

impl SecretCache {
    pub fn new(client: SecretsClient) -> Self {
        Self {
            client,
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Secret string for `secret_arn`, from cache when already fetched.
    pub async fn get(&self, secret_arn: &str) -> Result<String> {
        if let Some(value) = self.values.read().await.get(secret_arn) {
            return Ok(value.clone());
        }

        debug!("Fetching secret {}", secret_arn);
        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_arn)
            .send()
            .await
            .map_err(|e| Error::Aws(format!("Failed to get secret {}: {}", secret_arn, e)))?;

        let value = response
            .secret_string()
            .ok_or_else(|| Error::Aws(format!("Secret {} has no string value", secret_arn)))?
            .to_string();

        self.values
            .write()
            .await
            .insert(secret_arn.to_string(), value.clone());
        Ok(value)
    }

    /// Fetch a JSON secret and decode it.
    pub async fn get_json<T: DeserializeOwned>(&self, secret_arn: &str) -> Result<T> {
        let value = self.get(secret_arn).await?;
        parse_secret(secret_arn, &value)
    }

    /// Drop cached values so the next read goes back to Secrets Manager.
    pub async fn clear(&self) {
        self.values.write().await.clear();
    }
}

fn parse_secret<T: DeserializeOwned>(secret_arn: &str, secret_string: &str) -> Result<T> {
    serde_json::from_str(secret_string)
        .map_err(|e| Error::Aws(format!("Failed to parse secret {}: {}", secret_arn, e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::credentials::StoredToken;
    use aws_sdk_secretsmanager::config::{BehaviorVersion, Credentials, Region};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN_ARN: &str = "arn:aws:secretsmanager:ap-east-1:123456789012:secret:salon/google-token";

    /// Secrets Manager client that talks to a local mock server.
    pub(crate) fn mock_client(server: &MockServer) -> SecretsClient {
        let config = aws_sdk_secretsmanager::Config::builder()
            .endpoint_url(server.uri())
            .region(Region::new("ap-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .behavior_version(BehaviorVersion::latest())
            .build();
        SecretsClient::from_conf(config)
    }

    /// Answer `GetSecretValue` for `secret_arn` with `secret_string`.
    pub(crate) fn secret_value(secret_arn: &str, secret_string: &str) -> Mock {
        let body = json!({
            "ARN": secret_arn,
            "Name": secret_arn.rsplit(':').next().unwrap_or(secret_arn),
            "SecretString": secret_string,
        });
        Mock::given(method("POST"))
            .and(header("x-amz-target", "secretsmanager.GetSecretValue"))
            .and(body_partial_json(json!({ "SecretId": secret_arn })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body.to_string(), "application/x-amz-json-1.1"),
            )
    }

    #[tokio::test]
    async fn test_secret_fetched_once() {
        let server = MockServer::start().await;
        secret_value(TOKEN_ARN, r#"{"access_token":"ya29.a0","expiry_date":1767225600000}"#)
            .expect(1)
            .mount(&server)
            .await;

        let cache = SecretCache::new(mock_client(&server));
        let token: StoredToken = cache.get_json(TOKEN_ARN).await.unwrap();
        assert_eq!(token.access_token.as_deref(), Some("ya29.a0"));
        assert_eq!(token.expiry_date, Some(1_767_225_600_000));

        let again: StoredToken = cache.get_json(TOKEN_ARN).await.unwrap();
        assert_eq!(again.access_token.as_deref(), Some("ya29.a0"));
    }

    #[tokio::test]
    async fn test_clear_refetches() {
        let server = MockServer::start().await;
        secret_value(TOKEN_ARN, r#"{"access_token":"ya29.a0"}"#)
            .expect(2)
            .mount(&server)
            .await;

        let cache = SecretCache::new(mock_client(&server));
        cache.get(TOKEN_ARN).await.unwrap();
        cache.clear().await;
        cache.get(TOKEN_ARN).await.unwrap();
    }

    #[tokio::test]
    async fn test_binary_secret_rejected() {
        let server = MockServer::start().await;
        let body = json!({"ARN": TOKEN_ARN, "Name": "salon/google-token", "SecretBinary": "AAEC"});
        Mock::given(method("POST"))
            .and(header("x-amz-target", "secretsmanager.GetSecretValue"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body.to_string(), "application/x-amz-json-1.1"),
            )
            .mount(&server)
            .await;

        let cache = SecretCache::new(mock_client(&server));
        let err = cache.get(TOKEN_ARN).await.unwrap_err();
        assert!(matches!(err, Error::Aws(_)));
        assert!(err.to_string().contains("no string value"));
    }

    #[test]
    fn test_parse_error_names_secret() {
        let err = parse_secret::<StoredToken>("salon/google-token", "not json").unwrap_err();
        assert!(err.to_string().contains("salon/google-token"));
    }
}
