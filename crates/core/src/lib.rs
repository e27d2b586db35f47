//! # DialogBridge Core
//!
//! Domain types, traits, and error definitions for the DialogBridge
//! fulfillment webhook. This crate has **zero framework dependencies**: it
//! defines the domain model that the other crates implement against.
//!
//! ## Layout
//!
//! - [`message`]: the chat transcript sent to a completion model
//! - [`provider`]: the completion capability, as a trait
//! - [`fulfillment`]: the conversational platform's webhook wire format
//! - [`error`]: the error taxonomy shared by every crate

pub mod error;
pub mod fulfillment;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, WebhookError};
pub use fulfillment::{
    ContextEntry, ContextParameters, FulfillmentMessage, FulfillmentText, OutboundContext,
    QueryResult, SESSION_VARS_CONTEXT, SESSION_VARS_LIFESPAN, SessionVars, WebhookRequest,
    WebhookResponse,
};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
