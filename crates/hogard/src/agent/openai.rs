//! OpenAI-compatible chat completions client with a tool-call loop.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::tools::tool_definitions;
use super::tools::Toolbox;
use super::Agent;
use super::AgentError;
use crate::config::AgentConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChatMessage {
    role: String,

    #[serde(default)]
    content: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCall>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    fn tool_result(tool_call_id: String, content: String) -> Self {
        Self {
            tool_call_id: Some(tool_call_id),
            ..Self::new("tool", content)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ToolCall {
    id: String,

    #[serde(rename = "type", default = "function_type")]
    kind: String,

    function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FunctionCall {
    name: String,

    /// JSON-encoded arguments object
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: &'a serde_json::Value,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Agent backed by a `/chat/completions` endpoint
pub struct OpenAiAgent {
    http: Client,
    config: AgentConfig,
    system_prompt: String,
    tools: serde_json::Value,
    toolbox: Toolbox,
}

impl OpenAiAgent {
    pub fn new(
        config: &AgentConfig,
        system_prompt: String,
        toolbox: Toolbox,
    ) -> Result<Self, AgentError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(AgentError::Request)?;

        Ok(Self {
            http,
            config: config.clone(),
            system_prompt,
            tools: tool_definitions(),
            toolbox,
        })
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatMessage, AgentError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages,
            tools: &self.tools,
            temperature: self.config.temperature,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(AgentError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AgentError::InvalidResponse("no choices returned".to_string()))
    }
}

#[async_trait]
impl Agent for OpenAiAgent {
    async fn run(&self, text: &str) -> Result<String, AgentError> {
        if self.config.api_key.trim().is_empty() {
            return Err(AgentError::Config("OPENAI_API_KEY"));
        }

        let mut messages = vec![
            ChatMessage::new("system", self.system_prompt.as_str()),
            ChatMessage::new("user", text),
        ];

        for step in 0..self.config.max_steps {
            let reply = self.complete(&messages).await?;
            if reply.tool_calls.is_empty() {
                info!("Agent answered after {} step(s)", step + 1);
                return Ok(reply.content.unwrap_or_default().trim().to_string());
            }

            let calls = reply.tool_calls.clone();
            messages.push(reply);
            for call in calls {
                let output = self
                    .toolbox
                    .dispatch(&call.function.name, &call.function.arguments)
                    .await;
                debug!("{} -> {}", call.function.name, output);
                messages.push(ChatMessage::tool_result(call.id, output));
            }
        }

        Err(AgentError::StepLimit(self.config.max_steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_message_round_trips_openai_shape() {
        let raw = serde_json::json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": { "name": "turn_off_lights", "arguments": "{\"area\":\"cocina\"}" }
            }]
        });

        let message: ChatMessage = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(message.tool_calls[0].function.name, "turn_off_lights");
        assert_eq!(serde_json::to_value(&message).unwrap(), raw);
    }

    #[test]
    fn test_tool_result_message_shape() {
        let message = ChatMessage::tool_result("call_1".to_string(), "Luces apagadas en cocina".to_string());
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            serde_json::json!({
                "role": "tool",
                "content": "Luces apagadas en cocina",
                "tool_call_id": "call_1",
            })
        );
    }
}
