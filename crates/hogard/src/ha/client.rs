use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use reqwest::Response;
use reqwest::StatusCode;
use tracing::debug;
use tracing::warn;

use super::Backend;
use super::BackendError;
use super::EntityState;
use crate::config::ConfigError;
use crate::config::HomeAssistantConfig;

/// Real backend implementation using reqwest
#[derive(Debug, Clone)]
pub struct HaClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl HaClient {
    /// Build a client from configuration.
    ///
    /// Fails when the base URL or token is missing so that a misconfigured
    /// deployment stops at startup instead of on the first message.
    pub fn new(config: &HomeAssistantConfig) -> Result<Self, ConfigError> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ConfigError::Missing("HA_BASE_URL"));
        }
        let token = config.token.trim();
        if token.is_empty() {
            return Err(ConfigError::Missing("HA_TOKEN"));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ConfigError::Validation("HA_TOKEN contains invalid characters".to_string())
        })?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Validation(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_request_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Request(e)
        }
    }

    /// Turn non-2xx responses into errors carrying the response body
    async fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn read_json(&self, response: Response) -> Result<serde_json::Value, BackendError> {
        let text = response
            .text()
            .await
            .map_err(|e| self.map_request_error(e))?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Backend for HaClient {
    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        let url = format!("{}/api/services/{}/{}", self.base_url, domain, service);
        debug!("Calling service {}.{} with {}", domain, service, payload);

        let result: Result<serde_json::Value, BackendError> = async {
            let response = self
                .http
                .post(&url)
                .json(payload)
                .send()
                .await
                .map_err(|e| self.map_request_error(e))?;
            let response = Self::check_status(response).await?;
            self.read_json(response).await
        }
        .await;

        if let Err(e) = &result {
            warn!("Error calling service {}.{}: {}", domain, service, e);
        }
        result
    }

    async fn get_state(&self, entity_id: &str) -> Result<EntityState, BackendError> {
        let url = format!("{}/api/states/{}", self.base_url, entity_id);
        debug!("Fetching state of {}", entity_id);

        let result: Result<EntityState, BackendError> = async {
            let response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| self.map_request_error(e))?;
            let response = Self::check_status(response).await?;
            let value = self.read_json(response).await?;
            serde_json::from_value::<EntityState>(value)
                .map_err(|e| BackendError::InvalidResponse(e.to_string()))
        }
        .await;

        if let Err(e) = &result {
            warn!("Error fetching state of {}: {}", entity_id, e);
        }
        result
    }
}
