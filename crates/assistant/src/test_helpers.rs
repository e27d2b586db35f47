//! Shared test helpers for orchestrator tests.

use dialogbridge_core::error::ProviderError;
use dialogbridge_core::fulfillment::WebhookRequest;
use dialogbridge_core::message::Message;
use dialogbridge_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// A provider that always answers with the same text and keeps every
/// request it was sent.
pub struct RecordingProvider {
    reply: String,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl RecordingProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        Ok(ProviderResponse {
            message: Message::assistant(self.reply.as_str()),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

/// A provider whose every call fails with the given error.
pub struct FailingProvider {
    error: ProviderError,
}

impl FailingProvider {
    pub fn network() -> Self {
        Self {
            error: ProviderError::Network("connection refused".into()),
        }
    }
}

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(self.error.clone())
    }
}

/// Build a webhook request with the given contexts (a JSON array).
pub fn request(session: &str, query_text: &str, contexts: serde_json::Value) -> WebhookRequest {
    serde_json::from_value(serde_json::json!({
        "session": session,
        "queryResult": {
            "queryText": query_text,
            "parameters": {},
            "outputContexts": contexts,
        }
    }))
    .unwrap()
}
