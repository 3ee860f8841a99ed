use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Options forwarded to the completion capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.4),
            max_tokens: Some(1200),
            system_prompt: None,
        }
    }
}

/// The only AI capability the advisor depends on: turn a prompt into text.
///
/// Provider adapters, authentication and retries live outside this crate. An
/// implementation only has to answer a single prompt; failures are reported
/// through the returned `Result` and the caller decides whether to fall back.
#[async_trait]
pub trait CompletionEngine: Send + Sync {
    async fn generate_completion(&self, prompt: &str, options: &CompletionOptions)
        -> Result<String>;

    /// Human-readable engine name used in logs and warnings
    fn name(&self) -> &str {
        "completion-engine"
    }
}
