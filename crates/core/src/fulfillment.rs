//! Webhook wire format of the conversational platform.
//!
//! Inbound: the platform posts a [`WebhookRequest`] carrying the user's
//! utterance and every active context it holds for the session.
//! Outbound: we answer with a [`WebhookResponse`] holding the reply text
//! and, on success, one refreshed `session-vars` context that the platform
//! echoes back on the next turn. That echo is the only conversation memory.

use crate::error::WebhookError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Short id of the context this webhook owns.
pub const SESSION_VARS_CONTEXT: &str = "session-vars";

/// Number of turns the platform keeps the `session-vars` context alive.
pub const SESSION_VARS_LIFESPAN: u32 = 5;

// ── Inbound ─────────────────────────────────────────────────────────────

/// A fulfillment request posted by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    /// Platform-assigned id of this request, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,

    /// Opaque session path, e.g. `projects/p/agent/sessions/abc`.
    pub session: String,

    pub query_result: QueryResult,
}

impl WebhookRequest {
    /// Parse a raw request body.
    ///
    /// Any JSON or shape problem becomes [`WebhookError::MalformedInput`].
    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(body).map_err(|e| WebhookError::MalformedInput(e.to_string()))
    }

    /// The contexts the platform currently holds, oldest first.
    pub fn contexts(&self) -> &[ContextEntry] {
        &self.query_result.output_contexts
    }
}

/// The `queryResult` block of a fulfillment request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// What the user said this turn.
    pub query_text: String,

    /// Intent parameters extracted by the platform. Carried, not interpreted.
    #[serde(default, deserialize_with = "lenient")]
    pub parameters: serde_json::Map<String, serde_json::Value>,

    #[serde(default, deserialize_with = "lenient_contexts")]
    pub output_contexts: Vec<ContextEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

/// One active context as supplied by the platform.
///
/// The platform may hold contexts that have nothing to do with us; they
/// parse fine and simply carry no history keys. A field of the wrong type
/// reads as its default instead of failing the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient")]
    pub lifespan_count: i64,

    #[serde(default, deserialize_with = "lenient")]
    pub parameters: ContextParameters,
}

/// Parameters of an inbound context.
///
/// `lastAIResponse` and `lastUserQuery` are only recognised when they hold a
/// non-empty string. Every other key lands in `extra` and is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextParameters {
    #[serde(
        rename = "lastAIResponse",
        default,
        deserialize_with = "non_empty_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_ai_response: Option<String>,

    #[serde(
        rename = "lastUserQuery",
        default,
        deserialize_with = "non_empty_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_user_query: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Null or a value of the wrong type becomes `T::default()`.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Keeps every entry in place; one that is not a context object reads as an
/// empty context. Anything other than an array reads as no contexts.
fn lenient_contexts<'de, D>(deserializer: D) -> Result<Vec<ContextEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| ContextEntry::deserialize(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

fn non_empty_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) if !text.is_empty() => Some(text),
        _ => None,
    })
}

// ── Outbound ────────────────────────────────────────────────────────────

/// The fulfillment payload returned to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub fulfillment_messages: Vec<FulfillmentMessage>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_contexts: Vec<OutboundContext>,
}

impl WebhookResponse {
    /// A reply that also refreshes the session's `session-vars` context.
    pub fn reply(text: impl Into<String>, context: OutboundContext) -> Self {
        Self {
            fulfillment_messages: vec![FulfillmentMessage::text(text)],
            output_contexts: vec![context],
        }
    }

    /// A reply that leaves the platform's contexts untouched.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            fulfillment_messages: vec![FulfillmentMessage::text(text)],
            output_contexts: Vec::new(),
        }
    }

    /// First line of the first text message, if any.
    pub fn fulfillment_text(&self) -> Option<&str> {
        self.fulfillment_messages
            .first()
            .and_then(|m| m.text.text.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentMessage {
    pub text: FulfillmentText,
}

impl FulfillmentMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: FulfillmentText {
                text: vec![text.into()],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentText {
    pub text: Vec<String>,
}

/// The context we hand back so the next turn can see this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundContext {
    /// `<session>/contexts/session-vars`
    pub name: String,

    pub lifespan_count: u32,

    pub parameters: SessionVars,
}

impl OutboundContext {
    /// Build the `session-vars` context for one completed turn.
    pub fn session_vars(
        session: &str,
        last_ai_response: impl Into<String>,
        last_user_query: impl Into<String>,
    ) -> Self {
        Self {
            name: format!("{session}/contexts/{SESSION_VARS_CONTEXT}"),
            lifespan_count: SESSION_VARS_LIFESPAN,
            parameters: SessionVars {
                last_ai_response: last_ai_response.into(),
                last_user_query: last_user_query.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionVars {
    #[serde(rename = "lastAIResponse")]
    pub last_ai_response: String,

    #[serde(rename = "lastUserQuery")]
    pub last_user_query: String,
}
