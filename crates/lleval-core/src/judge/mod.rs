//! Prompt submission with retry and verdict extraction.

pub mod parse;

use crate::errors::EvalResult;
use crate::model::{DialogueSample, Dimension, Method, PairwiseSample, ScoreRecord};
use crate::prompt::PromptTemplate;
use crate::providers::llm::LlmClient;
use parse::{parse_verdict, verdict_pattern, ParsedVerdict};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Parsed { verdict: ParsedVerdict, attempts: u32 },
    /// Every attempt failed; `last_error` is set when the last one failed in transport.
    Exhausted { attempts: u32, last_error: Option<String> },
}

#[derive(Clone)]
pub struct JudgeService {
    client: Arc<dyn LlmClient>,
    gen_params: Arc<serde_json::Value>,
    num_retries: u32,
    /// Seed for the per-sample pairwise order; `None` keeps the given order.
    order_seed: Option<u64>,
}

impl JudgeService {
    pub fn new(client: Arc<dyn LlmClient>, gen_params: serde_json::Value, num_retries: u32) -> Self {
        Self {
            client,
            gen_params: Arc::new(gen_params),
            num_retries: num_retries.max(1),
            order_seed: None,
        }
    }

    pub fn with_order_seed(mut self, seed: Option<u64>) -> Self {
        self.order_seed = seed;
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.client.provider_name()
    }

    /// Submit `prompt` until a verdict line parses or the attempts run out.
    pub async fn submit(&self, prompt: &str, pattern: &Regex) -> SubmitOutcome {
        let mut last_error = None;
        for attempt in 1..=self.num_retries {
            match self.client.complete(prompt, &self.gen_params).await {
                Ok(resp) => {
                    if let Some(verdict) = parse_verdict(pattern, &resp.text) {
                        return SubmitOutcome::Parsed {
                            verdict,
                            attempts: attempt,
                        };
                    }
                    last_error = None;
                    debug!(attempt, "judge output has no verdict line");
                }
                Err(e) => {
                    warn!(attempt, error = %e, "judge request failed");
                    last_error = Some(e.to_string());
                }
            }
        }
        warn!(
            attempts = self.num_retries,
            pattern = pattern.as_str(),
            "no parsable verdict after retries"
        );
        SubmitOutcome::Exhausted {
            attempts: self.num_retries,
            last_error,
        }
    }

    /// Rate one sample on a 1..=5 scale.
    pub async fn rate(
        &self,
        id: usize,
        dimension: &Dimension,
        template: &PromptTemplate,
        sample: &DialogueSample,
    ) -> EvalResult<ScoreRecord> {
        let prompt = template.likert_prompt(
            dimension,
            &sample.system_output,
            &sample.source,
            &sample.context,
            "",
        )?;
        let pattern = verdict_pattern(Method::Likert, dimension)?;
        Ok(to_record(id, dimension, self.submit(&prompt, &pattern).await, false))
    }

    /// Pick the better of two responses. The presentation order is randomized per
    /// sample when an order seed is set; the returned score always refers to the
    /// caller's order (1.0 = `response_1` won).
    pub async fn compare(
        &self,
        id: usize,
        dimension: &Dimension,
        template: &PromptTemplate,
        pair: &PairwiseSample,
    ) -> EvalResult<ScoreRecord> {
        let swapped = self.order_seed.is_some_and(|seed| should_swap(seed, id));
        let (first, second) = if swapped {
            (&pair.response_2, &pair.response_1)
        } else {
            (&pair.response_1, &pair.response_2)
        };
        let prompt = template.pairwise_prompt(dimension, &pair.source, &pair.context, first, second)?;
        let pattern = verdict_pattern(Method::Winrate, dimension)?;

        let mut outcome = self.submit(&prompt, &pattern).await;
        if let SubmitOutcome::Parsed { verdict, .. } = &mut outcome {
            if swapped {
                verdict.value = 3 - verdict.value;
            }
        }
        Ok(to_record(id, dimension, outcome, swapped))
    }
}

/// Deterministic coin flip for sample `id` under `seed`.
pub fn should_swap(seed: u64, id: usize) -> bool {
    let mut rng = StdRng::seed_from_u64(seed ^ (id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    rng.gen_bool(0.5)
}

fn to_record(id: usize, dimension: &Dimension, outcome: SubmitOutcome, swapped: bool) -> ScoreRecord {
    match outcome {
        SubmitOutcome::Parsed { verdict, .. } => ScoreRecord {
            id,
            dimension: dimension.name.clone(),
            score: f64::from(verdict.value),
            explanation: verdict.explanation,
            parsed: true,
            swapped,
        },
        SubmitOutcome::Exhausted { .. } => ScoreRecord {
            swapped,
            ..ScoreRecord::unparsed(id, dimension.name.clone())
        },
    }
}
