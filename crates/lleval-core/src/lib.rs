//! LLM-as-judge evaluation for knowledge-grounded dialogue systems.
//!
//! This crate provides:
//!
//! - Dataset collectors for DSTC9 / DSTC11 dialogue logs, labels and knowledge
//! - Prompt templates for Likert and pairwise judging
//! - An HTTP judge client (TGI `/generate`) behind the [`LlmClient`] trait
//! - Bounded concurrent scoring with retry and verdict parsing
//! - Metric reports and rank correlation against human ratings
//!
//! # Quick Start
//!
//! ```no_run
//! use lleval_core::{DialogEvaluator, JudgeConfig, JudgeService, PromptScorer, PromptTemplate, TgiClient};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> lleval_core::EvalResult<()> {
//! let config = JudgeConfig::from_env();
//! let client = Arc::new(TgiClient::new(&config)?);
//! let judge = JudgeService::new(client, serde_json::json!({"max_new_tokens": 512}), config.num_retries);
//! let template = PromptTemplate::load(Path::new("config/prompts.json"))?;
//! let scorer = PromptScorer::new(judge, template, config.batch_size);
//! let evaluator = DialogEvaluator::from_definitions_file(scorer, Path::new("config/dimensions.json"))?;
//! let report = evaluator.evaluate(&[], None, true).await?;
//! println!("{} samples", report.samples.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod correlation;
pub mod dataset;
pub mod errors;
pub mod evaluator;
pub mod judge;
pub mod model;
pub mod prompt;
pub mod providers;
pub mod report;
pub mod scorer;

pub use config::{JudgeConfig, MetricConfig};
pub use dataset::{DataCollector, DstcDataCollector, DummyDataCollector, Prediction};
pub use errors::{EvalError, EvalResult};
pub use evaluator::{DialogEvaluator, EvalReport, WinrateReport};
pub use judge::JudgeService;
pub use model::{
    DialogueSample, Dimension, Method, PairwiseSample, SampleContext, SampleScores, ScoreRecord,
};
pub use prompt::PromptTemplate;
pub use providers::llm::fake::FakeClient;
pub use providers::llm::tgi::TgiClient;
pub use providers::llm::{LlmClient, LlmResponse};
pub use scorer::PromptScorer;
