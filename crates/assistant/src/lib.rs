//! The fulfillment core of DialogBridge.
//!
//! One webhook call runs through two steps:
//!
//! 1. **Reconstruct** prior turns from the contexts the platform echoed back
//!    ([`context::reconstruct_history`])
//! 2. **Complete** the transcript `[system, ...history, user]` with the
//!    configured provider and shape the reply, or fall back
//!    ([`Orchestrator`])
//!
//! Nothing here keeps state between calls: the refreshed `session-vars`
//! context in each reply is the only memory a conversation has.

pub mod context;
pub mod orchestrator;

#[cfg(test)]
mod test_helpers;

pub use context::reconstruct_history;
pub use orchestrator::Orchestrator;
