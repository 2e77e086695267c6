//! Bearer token acquisition for the Google Drive store.
//!
//! Interactive consent is out of scope: the operator provides either a
//! ready access token or a refresh token obtained elsewhere.

use std::env;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{Result, StoreError};

pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_DRIVE_ACCESS_TOKEN";
pub const CLIENT_ID_VAR: &str = "GOOGLE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "GOOGLE_CLIENT_SECRET";
pub const REFRESH_TOKEN_VAR: &str = "GOOGLE_REFRESH_TOKEN";

pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Where the access token comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    AccessToken(String),
    RefreshToken { client_id: String, client_secret: String, refresh_token: String },
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl Credentials {
    /// Reads credentials from the process environment (after `.env` is loaded)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(ACCESS_TOKEN_VAR) {
            return Ok(Credentials::AccessToken(token));
        }
        match (non_empty(CLIENT_ID_VAR), non_empty(CLIENT_SECRET_VAR), non_empty(REFRESH_TOKEN_VAR)) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => {
                Ok(Credentials::RefreshToken { client_id, client_secret, refresh_token })
            }
            _ => Err(StoreError::Auth(format!(
                "set {} or all of {}, {} and {}",
                ACCESS_TOKEN_VAR, CLIENT_ID_VAR, CLIENT_SECRET_VAR, REFRESH_TOKEN_VAR
            ))),
        }
    }

    /// Whether a rejected access token can be replaced during the run
    pub fn can_refresh(&self) -> bool {
        matches!(self, Credentials::RefreshToken { .. })
    }

    /// Produces a usable access token, exchanging the refresh token if needed
    pub async fn access_token(&self, client: &Client, token_url: &str) -> Result<String> {
        match self {
            Credentials::AccessToken(token) => {
                debug!("using access token from environment");
                Ok(token.clone())
            }
            Credentials::RefreshToken { client_id, client_secret, refresh_token } => {
                info!("refreshing Google Drive access token");
                let resp = client
                    .post(token_url)
                    .form(&[
                        ("grant_type", "refresh_token"),
                        ("client_id", client_id.as_str()),
                        ("client_secret", client_secret.as_str()),
                        ("refresh_token", refresh_token.as_str()),
                    ])
                    .send()
                    .await
                    .map_err(|e| StoreError::Auth(e.to_string()))?;

                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(StoreError::Auth(format!("token endpoint responded {}: {}", status.as_u16(), body)));
                }
                let token: TokenResponse = resp.json().await.map_err(|e| StoreError::Auth(e.to_string()))?;
                Ok(token.access_token)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_access_token_takes_precedence() {
        let creds = Credentials::from_lookup(lookup(&[
            (ACCESS_TOKEN_VAR, "tok"),
            (REFRESH_TOKEN_VAR, "refresh"),
        ])).unwrap();
        assert_eq!(creds, Credentials::AccessToken("tok".to_string()));
    }

    #[test]
    fn test_refresh_requires_all_parts() {
        let err = Credentials::from_lookup(lookup(&[
            (CLIENT_ID_VAR, "id"),
            (REFRESH_TOKEN_VAR, "refresh"),
        ])).unwrap_err();
        assert!(matches!(err, StoreError::Auth(_)));
    }

    #[test]
    fn test_blank_access_token_is_ignored() {
        let creds = Credentials::from_lookup(lookup(&[
            (ACCESS_TOKEN_VAR, "  "),
            (CLIENT_ID_VAR, "id"),
            (CLIENT_SECRET_VAR, "secret"),
            (REFRESH_TOKEN_VAR, "refresh"),
        ])).unwrap();
        assert!(matches!(creds, Credentials::RefreshToken { .. }));
    }

    #[tokio::test]
    async fn test_refresh_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let creds = Credentials::RefreshToken {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
        };
        let token = creds.access_token(&Client::new(), &format!("{}/token", server.uri())).await.unwrap();
        assert_eq!(token, "fresh-token");
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let creds = Credentials::RefreshToken {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "bad".to_string(),
        };
        let err = creds.access_token(&Client::new(), &format!("{}/token", server.uri())).await.unwrap_err();
        assert!(matches!(err, StoreError::Auth(msg) if msg.contains("invalid_grant")));
    }
}
