//! Mock backend for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use marksman_core::traits::{CompletionRequest, CompletionResponse, LlmProvider, TokenUsage};

/// A mock backend for testing the grading engine without real API calls.
///
/// Returns configurable responses based on system-prompt content matching.
pub struct MockProvider {
    /// Map of system-prompt substring → response text.
    responses: HashMap<String, String>,
    /// Default response if no prompt matches.
    default_response: String,
    /// Error to return instead of a response, if set.
    error: Option<String>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockProvider {
    /// Create a new mock with the given prompt→response mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: r#"{"score": 0, "feedback": "", "strengths": []}"#.to_string(),
            error: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            responses: HashMap::new(),
            default_response: response.to_string(),
            error: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that fails every call with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: HashMap::new(),
            default_response: String::new(),
            error: Some(message.to_string()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Get the number of calls made to this backend.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this backend.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if let Some(message) = &self.error {
            anyhow::bail!("{message}");
        }

        let text = self
            .responses
            .iter()
            .find(|(key, _)| request.system_prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        let completion_tokens = (text.len() / 4) as u32; // Rough estimate
        let prompt_tokens =
            ((request.system_prompt.len() + request.user_prompt.len()) / 4) as u32;

        Ok(CompletionResponse {
            text,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }
}
