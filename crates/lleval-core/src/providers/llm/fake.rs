use super::{LlmClient, LlmResponse};
use crate::errors::{EvalError, EvalResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Offline client: replays scripted responses, then falls back to a fixed one.
#[derive(Debug, Default)]
pub struct FakeClient {
    scripted: Mutex<VecDeque<String>>,
    fixed_response: Option<String>,
    calls: AtomicUsize,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    pub fn with_script<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut q) = self.scripted.lock() {
            q.extend(responses.into_iter().map(Into::into));
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(
        &self,
        _prompt: &str,
        _params: &serde_json::Value,
    ) -> EvalResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.scripted.lock().ok().and_then(|mut q| q.pop_front());
        let text = scripted
            .or_else(|| self.fixed_response.clone())
            .ok_or_else(|| EvalError::InvalidResponse {
                message: "fake client has no more responses".to_string(),
            })?;

        Ok(LlmResponse {
            text,
            provider: self.provider_name().to_string(),
            meta: serde_json::Value::Null,
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
