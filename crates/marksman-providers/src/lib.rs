//! marksman-providers — language-model backend integrations.
//!
//! Implements the `LlmProvider` trait for Anthropic and OpenAI, plus a mock
//! backend for testing the grading engine without real API calls.

pub mod anthropic;
pub mod config;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config, MarksmanConfig, ProviderConfig};
pub use marksman_core::error::ProviderError;
