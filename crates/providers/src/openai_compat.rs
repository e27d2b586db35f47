//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Groq, Together AI, and any
//! endpoint exposing `/v1/chat/completions`.

use async_trait::async_trait;
use dialogbridge_core::error::ProviderError;
use dialogbridge_core::message::{Message, Role};
use dialogbridge_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible completion provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    requires_key: bool,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            requires_key: true,
            client,
        }
    }

    /// Create a provider for a self-hosted backend (Ollama, vLLM, llama.cpp)
    /// that serves without a key. No `Authorization` header is sent.
    pub fn local(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            requires_key: false,
            ..Self::new(name, base_url, "")
        }
    }

    /// Attach the bearer token, if there is one.
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            request
        } else {
            request.header("Authorization", format!("Bearer {}", self.api_key))
        }
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().into(),
                content: Some(m.content.clone()),
            })
            .collect()
    }

    /// Map a non-200 status to the matching error.
    async fn status_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        match status {
            429 => ProviderError::RateLimited {
                retry_after_secs: response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
            },
            401 | 403 => ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ),
            _ => {
                let error_body = response.text().await.unwrap_or_default();
                warn!(provider = %self.name, status, body = %error_body, "Provider returned error");
                ProviderError::ApiError {
                    status_code: status,
                    message: error_body,
                }
            }
        }
    }
}

#[async_trait]
impl dialogbridge_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        if self.requires_key && self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for provider '{}'",
                self.name
            )));
        }

        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .authorized(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if response.status().as_u16() != 200 {
            return Err(self.status_error(response).await);
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message: Message {
                role: Role::Assistant,
                content: choice.message.content.unwrap_or_default(),
            },
            usage,
            model: api_response.model.unwrap_or(request.model),
        })
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let models = body["data"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m["id"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use dialogbridge_core::Provider;
    use std::sync::{Arc, Mutex};

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn request(messages: Vec<Message>) -> ProviderRequest {
        ProviderRequest {
            model: "gpt-4o-mini".into(),
            messages,
            temperature: 0.5,
            max_tokens: Some(300),
        }
    }

    #[test]
    fn local_constructor_needs_no_key() {
        let provider = OpenAiCompatProvider::local("ollama", "http://localhost:11434/v1");
        assert_eq!(provider.name(), "ollama");
        assert!(!provider.requires_key);
        assert!(provider.api_key.is_empty());
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider = OpenAiCompatProvider::new("custom", "http://host/v1/", "k");
        assert_eq!(provider.base_url, "http://host/v1");
    }

    #[test]
    fn message_conversion() {
        let messages = vec![
            Message::system("You are helpful"),
            Message::assistant("Earlier answer"),
            Message::user("Hello"),
        ];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 3);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "assistant");
        assert_eq!(api_messages[2].role, "user");
        assert_eq!(api_messages[2].content.as_deref(), Some("Hello"));
    }

    #[test]
    fn parse_response_with_null_content() {
        let data = r#"{"model":"gpt-4o-mini","choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
        assert!(parsed.usage.is_none());
    }

    #[tokio::test]
    async fn complete_sends_request_and_parses_reply() {
        let seen = Arc::new(Mutex::new(None::<serde_json::Value>));
        let captured = seen.clone();
        let router = Router::new().route(
            "/v1/chat/completions",
            post(move |Json(body): Json<serde_json::Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some(body);
                    Json(serde_json::json!({
                        "model": "gpt-4o-mini-2024-07-18",
                        "choices": [ { "message": { "role": "assistant", "content": "Please contact a branch." } } ],
                        "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
                    }))
                }
            }),
        );
        let base = serve(router).await;
        let provider = OpenAiCompatProvider::new("openai", base, "sk-test");

        let response = provider
            .complete(request(vec![
                Message::system("Be brief"),
                Message::user("Rates?"),
            ]))
            .await
            .unwrap();

        assert_eq!(response.message.content, "Please contact a branch.");
        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(response.usage.unwrap().total_tokens, 17);

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Rates?");
    }

    #[tokio::test]
    async fn rate_limit_maps_to_rate_limited() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, [("retry-after", "12")], "slow down") }),
        );
        let provider = OpenAiCompatProvider::new("openai", serve(router).await, "sk-test");
        let err = provider.complete(request(vec![Message::user("hi")])).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { retry_after_secs: 12 }));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_failure() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { StatusCode::UNAUTHORIZED }),
        );
        let provider = OpenAiCompatProvider::new("openai", serve(router).await, "sk-bad");
        let err = provider.complete(request(vec![Message::user("hi")])).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn server_error_carries_status_and_body() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let provider = OpenAiCompatProvider::new("openai", serve(router).await, "sk-test");
        let err = provider.complete(request(vec![Message::user("hi")])).await.unwrap_err();
        match err {
            ProviderError::ApiError { status_code, message } => {
                assert_eq!(status_code, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_malformed() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(serde_json::json!({ "model": "m", "choices": [] })) }),
        );
        let provider = OpenAiCompatProvider::new("openai", serve(router).await, "sk-test");
        let err = provider.complete(request(vec![Message::user("hi")])).await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn missing_api_key_is_not_configured() {
        let provider = OpenAiCompatProvider::new("openai", "http://127.0.0.1:9/v1", "");
        let err = provider.complete(request(vec![Message::user("hi")])).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn local_backend_completes_without_key_or_auth_header() {
        let saw_auth = Arc::new(Mutex::new(None::<bool>));
        let captured = saw_auth.clone();
        let router = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: axum::http::HeaderMap| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some(headers.contains_key("authorization"));
                    Json(serde_json::json!({
                        "choices": [ { "message": { "role": "assistant", "content": "local reply" } } ]
                    }))
                }
            }),
        );
        let provider = OpenAiCompatProvider::local("ollama", serve(router).await);

        let response = provider.complete(request(vec![Message::user("hi")])).await.unwrap();

        assert_eq!(response.message.content, "local reply");
        assert_eq!(response.model, "gpt-4o-mini");
        assert_eq!(*saw_auth.lock().unwrap(), Some(false));
    }

    #[tokio::test]
    async fn list_models_reads_ids() {
        let router = Router::new().route(
            "/v1/models",
            axum::routing::get(|| async {
                Json(serde_json::json!({
                    "data": [ { "id": "gpt-4o-mini" }, { "id": "gpt-4o" }, { "object": "model" } ]
                }))
            }),
        );
        let provider = OpenAiCompatProvider::new("openai", serve(router).await, "sk-test");

        let models = provider.list_models().await.unwrap();
        assert_eq!(models, vec!["gpt-4o-mini", "gpt-4o"]);
        assert!(provider.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Port 9 (discard) is closed on test hosts.
        let provider = OpenAiCompatProvider::new("openai", "http://127.0.0.1:9/v1", "sk-test");
        let err = provider.complete(request(vec![Message::user("hi")])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
