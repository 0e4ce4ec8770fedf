//! Chat-completion client for OpenAI-compatible backends.
//!
//! Ollama, DeepSeek and NVIDIA NIM all speak the same `/chat/completions`
//! protocol, so one client covers every provider; only the resolved
//! [`ProviderConfig`] differs.

mod config;

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use config::{Provider, ProviderConfig, ProviderOverrides};

/// Default request timeout, matching the usual OpenAI client default.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Errors returned by a chat backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Anything that can answer a list of chat messages with one assistant reply.
pub trait ChatBackend {
    /// Submit `messages` and return the assistant reply, trimmed.
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, BackendError>;
}

/// Chat-completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client bound to one provider.
pub struct LlmClient {
    config: ProviderConfig,
    client: Client,
}

impl LlmClient {
    /// Create a client with the default timeout.
    pub fn new(config: ProviderConfig) -> Result<Self, BackendError> {
        Self::with_timeout(config, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(config: ProviderConfig, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Send a chat-completion request.
    ///
    /// Only the non-streaming form is supported; `stream = true` is rejected.
    pub fn create_completion(
        &self,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<String, BackendError> {
        if stream {
            return Err(BackendError::Parse(
                "streaming responses are not supported".to_string(),
            ));
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            stream,
        };

        let url = self.config.completions_url();
        debug!(
            "POST {} (provider: {}, model: {}, {} messages)",
            url,
            self.config.provider,
            self.config.model,
            messages.len()
        );

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        parse_completion(&body)
    }
}

impl ChatBackend for LlmClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, BackendError> {
        self.create_completion(messages, false)
    }
}

/// Pull the first choice's content out of a chat-completions response body.
fn parse_completion(body: &str) -> Result<String, BackendError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::Parse("response contained no choices".to_string()))?;

    Ok(choice
        .message
        .content
        .unwrap_or_default()
        .trim()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let messages = vec![
            ChatMessage::system("You classify documents."),
            ChatMessage::user("A summary"),
        ];
        let request = ChatRequest {
            model: "gemma2:latest",
            messages: &messages,
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gemma2:latest");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "A summary");
    }

    #[test]
    fn test_parse_completion_trims() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  vGPU\n"}, "finish_reason": "stop"}
            ]
        }"#;
        assert_eq!(parse_completion(body).unwrap(), "vGPU");
    }

    #[test]
    fn test_parse_completion_takes_first_choice() {
        let body = r#"{"choices": [
            {"message": {"role": "assistant", "content": "Omniverse"}},
            {"message": {"role": "assistant", "content": "NVAIE"}}
        ]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Omniverse");
    }

    #[test]
    fn test_parse_completion_null_content() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "");
    }

    #[test]
    fn test_parse_completion_errors() {
        assert!(matches!(
            parse_completion(r#"{"choices": []}"#),
            Err(BackendError::Parse(_))
        ));
        assert!(matches!(
            parse_completion(r#"{"error": {"message": "invalid api key"}}"#),
            Err(BackendError::Parse(_))
        ));
        assert!(matches!(
            parse_completion("<html>Bad Gateway</html>"),
            Err(BackendError::Parse(_))
        ));
    }

    #[test]
    fn test_streaming_rejected() {
        let config = ProviderConfig::resolve(Provider::Ollama, None, |_| None);
        let client = LlmClient::new(config).unwrap();
        let result = client.create_completion(&[ChatMessage::user("hi")], true);
        assert!(matches!(result, Err(BackendError::Parse(_))));
    }

    #[test]
    fn test_unreachable_backend_is_connection_error() {
        let overrides = ProviderOverrides {
            // Port 9 (discard) on loopback is not expected to serve HTTP
            endpoint: Some("http://127.0.0.1:9/v1".to_string()),
            model: None,
        };
        let config = ProviderConfig::resolve(Provider::Ollama, Some(&overrides), |_| None);
        let client = LlmClient::with_timeout(config, Duration::from_secs(5)).unwrap();
        let result = client.complete(&[ChatMessage::user("hi")]);
        assert!(matches!(result, Err(BackendError::Connection(_))));
    }
}
