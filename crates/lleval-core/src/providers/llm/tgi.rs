//! Client for a text-generation-inference style `/generate` endpoint.

use super::{LlmClient, LlmResponse};
use crate::config::JudgeConfig;
use crate::errors::{EvalError, EvalResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const USER_AGENT_VALUE: &str = concat!("lleval/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct TgiClient {
    client: reqwest::Client,
    url: String,
}

impl TgiClient {
    pub fn new(config: &JudgeConfig) -> EvalResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| EvalError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LlmClient for TgiClient {
    async fn complete(
        &self,
        prompt: &str,
        params: &serde_json::Value,
    ) -> EvalResult<LlmResponse> {
        let body = json!({
            "inputs": prompt,
            "parameters": params,
        });
        debug!(url = %self.url, prompt_chars = prompt.len(), "submitting prompt");

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EvalError::Network {
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EvalError::Provider {
                provider: self.provider_name().to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = resp.json().await.map_err(|e| EvalError::InvalidResponse {
            message: format!("response is not JSON: {}", e),
        })?;

        // TGI answers with an object, or a one-element array for batched inputs.
        let text = json
            .get("generated_text")
            .or_else(|| json.pointer("/0/generated_text"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| EvalError::InvalidResponse {
                message: "response missing 'generated_text'".to_string(),
            })?
            .to_string();

        let meta = json.get("details").cloned().unwrap_or(serde_json::Value::Null);
        Ok(LlmResponse {
            text,
            provider: self.provider_name().to_string(),
            meta,
        })
    }

    fn provider_name(&self) -> &'static str {
        "tgi"
    }
}
