use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::Client;

pub const GOOGLE_REVOKE_ENDPOINT: &str = "https://oauth2.googleapis.com/revoke";

#[async_trait]
pub trait TokenRevoker: Send + Sync {
    async fn revoke(&self, access_token: &str) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTokenRevoker {
    client: Client,
    endpoint: String,
}

impl Default for ReqwestTokenRevoker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, serde::Deserialize)]
struct GoogleErrorPayload {
    error: Option<String>,
    error_description: Option<String>,
}

impl ReqwestTokenRevoker {
    pub fn new() -> Self {
        Self::with_endpoint(GOOGLE_REVOKE_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TokenRevoker for ReqwestTokenRevoker {
    async fn revoke(&self, access_token: &str) -> Result<(), InfraError> {
        if access_token.trim().is_empty() {
            return Err(InfraError::Auth("access token must not be empty".to_string()));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("token", access_token)])
            .send()
            .await
            .map_err(|error| InfraError::Auth(format!("revoke request failed: {error}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Auth(format!("failed reading revoke response: {error}")))?;
        let detail = serde_json::from_str::<GoogleErrorPayload>(&body)
            .ok()
            .map(|payload| {
                let code = payload.error.unwrap_or_else(|| "unknown_error".to_string());
                match payload.error_description {
                    Some(description) => format!("{code}; {description}"),
                    None => code,
                }
            })
            .unwrap_or(body);
        Err(InfraError::Auth(format!(
            "revoke endpoint error: http_{}; {detail}",
            status.as_u16()
        )))
    }
}
