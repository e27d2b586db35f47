//! Completion orchestration for one fulfillment turn.

use std::sync::Arc;

use dialogbridge_core::error::{ProviderError, WebhookError};
use dialogbridge_core::fulfillment::{OutboundContext, WebhookRequest, WebhookResponse};
use dialogbridge_core::message::Message;
use dialogbridge_core::provider::{Provider, ProviderRequest};
use tracing::{debug, error, info, trace};

use crate::context::reconstruct_history;

/// Assembles the transcript, calls the provider once, and shapes the reply.
///
/// Holds no per-conversation state, so one instance serves every request
/// concurrently behind an `Arc`.
pub struct Orchestrator {
    /// The completion capability
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per reply
    max_tokens: Option<u32>,

    /// First message of every transcript
    system_directive: Message,

    /// Reply used whenever a turn fails
    fallback_message: String,
}

impl Orchestrator {
    /// Create an orchestrator with the stock directive and fallback text.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        let assistant = dialogbridge_config::AssistantConfig::default();
        Self {
            provider,
            model: model.into(),
            temperature: 0.5,
            max_tokens: Some(300),
            system_directive: Message::system(assistant.system_prompt),
            fallback_message: assistant.fallback_message,
        }
    }

    /// Build an orchestrator from application configuration.
    pub fn from_config(provider: Arc<dyn Provider>, config: &dialogbridge_config::AppConfig) -> Self {
        Self::new(provider, config.active_model())
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_system_prompt(config.assistant.system_prompt.clone())
            .with_fallback_message(config.assistant.fallback_message.clone())
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per reply.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Replace the system directive.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_directive = Message::system(prompt);
        self
    }

    /// Replace the fallback reply.
    pub fn with_fallback_message(mut self, text: impl Into<String>) -> Self {
        self.fallback_message = text.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// `[system, ...history, user(query_text)]`
    pub fn assemble(&self, history: Vec<Message>, query_text: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(self.system_directive.clone());
        messages.extend(history);
        messages.push(Message::user(query_text));
        messages
    }

    /// One completion attempt. Blank output counts as a failure.
    pub async fn complete(&self, messages: Vec<Message>) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }

        let reply = response.message.content;
        if reply.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }
        Ok(reply)
    }

    /// Run one turn, surfacing failures to the caller.
    pub async fn fulfill(&self, request: &WebhookRequest) -> Result<WebhookResponse, WebhookError> {
        let query_text = request.query_result.query_text.as_str();
        let history = reconstruct_history(request.contexts());
        debug!(
            contexts = request.contexts().len(),
            history = history.len(),
            "Reconstructed history"
        );

        let messages = self.assemble(history, query_text);
        trace!(messages = ?messages, "Transcript sent to provider");

        let reply = self.complete(messages).await?;
        let context = OutboundContext::session_vars(&request.session, reply.as_str(), query_text);
        Ok(WebhookResponse::reply(reply, context))
    }

    /// The user-safe reply for a failed turn. Never carries a context, so the
    /// platform keeps the last good `session-vars` for the next turn.
    pub fn fallback(&self) -> WebhookResponse {
        WebhookResponse::text_only(self.fallback_message.as_str())
    }

    /// Log a failure and return the fallback reply.
    pub fn recover(&self, err: &WebhookError) -> WebhookResponse {
        error!(kind = err.kind(), error = %err, "Fulfillment failed, sending fallback");
        self.fallback()
    }

    /// Run one turn; any failure becomes the fallback reply.
    pub async fn handle(&self, request: &WebhookRequest) -> WebhookResponse {
        match self.fulfill(request).await {
            Ok(response) => {
                info!(
                    provider = %self.provider.name(),
                    reply_len = response.fulfillment_text().map_or(0, str::len),
                    "Fulfillment sent"
                );
                response
            }
            Err(e) => self.recover(&e),
        }
    }
}
