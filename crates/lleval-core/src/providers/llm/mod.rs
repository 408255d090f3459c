pub mod fake;
pub mod tgi;

use crate::errors::EvalResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for `prompt`; `params` are passed through as generation parameters.
    async fn complete(&self, prompt: &str, params: &serde_json::Value)
        -> EvalResult<LlmResponse>;

    fn provider_name(&self) -> &'static str;
}
