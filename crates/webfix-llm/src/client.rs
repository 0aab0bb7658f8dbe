//! Minimal chat-completions client.

use serde::{Deserialize, Serialize};
use tracing::debug;
use webfix_core::{Redactor, ServiceError};

use crate::config::LlmConfig;
use crate::parse::{truncate_str, ERROR_BODY_CHARS};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: LlmConfig,
    http_client: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ServiceError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(LlmClient {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Send one system + user exchange and return the first choice's text.
    pub async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String, ServiceError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ServiceError::Configuration("no API key configured (WEBFIX_LLM_API_KEY)".to_string())
        })?;
        let scrub = Redactor::new().with_secret(api_key);

        let request = ChatRequest {
            model,
            messages: [
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
        };

        let url = self.config.completions_url();
        debug!(url = %url, model = %model, "Calling chat completions");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::Http(scrub.redact(&e.to_string())))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Http(scrub.redact(&e.to_string())))?;

        if !status.is_success() {
            // Scrub the whole body first; a cut could split the key.
            let body = scrub.redact(text.trim());
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: truncate_str(&body, ERROR_BODY_CHARS).to_string(),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            ServiceError::InvalidResponse(format!("failed to parse completion: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ServiceError::InvalidResponse("completion has no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> LlmClient {
        LlmClient::new(LlmConfig::new(&server.url("/v1")).with_api_key("sk-test-key")).unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer sk-test-key")
                    .body_includes("\"model\":\"gpt-4o\"");
                then.status(200).json_body(json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": "<p>Hello</p>"}},
                        {"message": {"role": "assistant", "content": "ignored"}}
                    ]
                }));
            })
            .await;

        let text = client_for(&server)
            .complete("gpt-4o", "system", "user")
            .await
            .unwrap();

        assert_eq!(text, "<p>Hello</p>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_truncated_and_scrubbed() {
        let server = MockServer::start_async().await;
        let body = format!("bad key sk-test-key {}", "x".repeat(500));
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(401).body(body.as_str());
            })
            .await;

        let err = client_for(&server)
            .complete("gpt-4o", "s", "u")
            .await
            .unwrap_err();

        match err {
            ServiceError::Status { status, body } => {
                assert_eq!(status, 401);
                assert!(!body.contains("sk-test-key"));
                assert!(body.chars().count() <= ERROR_BODY_CHARS);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_key_straddling_truncation_point_is_scrubbed() {
        let server = MockServer::start_async().await;
        // The key starts three characters before the cut.
        let body = format!("{}sk-test-key trailing", "x".repeat(ERROR_BODY_CHARS - 3));
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(403).body(body.as_str());
            })
            .await;

        let err = client_for(&server)
            .complete("gpt-4o", "s", "u")
            .await
            .unwrap_err();

        match err {
            ServiceError::Status { body, .. } => {
                assert!(!body.contains("sk-"), "{body}");
                assert!(body.ends_with("***"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({"choices": []}));
            })
            .await;

        let err = client_for(&server)
            .complete("gpt-4o", "s", "u")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let client = LlmClient::new(LlmConfig::new("http://127.0.0.1:1/v1")).unwrap();
        let err = client.complete("m", "s", "u").await.unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }
}
