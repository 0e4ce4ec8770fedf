//! LLM provider gateway.
//!
//! Every provider is reached through its OpenAI-compatible chat-completions
//! endpoint; the provider identity only selects endpoint, credential and model.

mod client;

pub use client::{
    BackendError, ChatBackend, ChatMessage, LlmClient, Provider, ProviderConfig,
    ProviderOverrides, Role, DEFAULT_TIMEOUT_SECS,
};
