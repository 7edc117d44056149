use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;
use tracing::warn;

use crate::config::WhatsAppConfig;

/// Longest text body sent in one message
pub const MAX_TEXT_CHARS: usize = 4000;

const SEND_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    #[error("{0} is not configured")]
    Config(&'static str),

    #[error("recipient and text are required")]
    EmptyMessage,

    #[error("Error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("connection error: {0}")]
    Request(#[from] reqwest::Error),
}

/// Outbound text delivery
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), MessengerError>;
}

/// WhatsApp Cloud API sender
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    http: Client,
    api_base: String,
    access_token: String,
    phone_number_id: String,
}

impl WhatsAppClient {
    pub fn new(config: &WhatsAppConfig) -> Result<Self, MessengerError> {
        let http = Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            phone_number_id: config.phone_number_id.clone(),
        })
    }
}

/// Cut `text` to at most `max` characters, on a char boundary
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl Messenger for WhatsAppClient {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), MessengerError> {
        if self.access_token.is_empty() {
            return Err(MessengerError::Config("WA_ACCESS_TOKEN"));
        }
        if self.phone_number_id.is_empty() {
            return Err(MessengerError::Config("WA_PHONE_NUMBER_ID"));
        }
        if to.is_empty() || text.is_empty() {
            return Err(MessengerError::EmptyMessage);
        }

        let url = format!("{}/{}/messages", self.api_base, self.phone_number_id);
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": truncate_chars(text, MAX_TEXT_CHARS) },
        });

        debug!("Sending WhatsApp message to {}", to);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .inspect_err(|e| warn!("Connection error sending WhatsApp message to {}: {}", to, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Error sending WhatsApp message to {}: {} {}", to, status, body);
            return Err(MessengerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
