use crate::errors::{EvalError, EvalResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Explanation stored with a verdict the judge never produced in the expected syntax.
pub const UNPARSED_EXPLANATION: &str = "Error in syntax retrieval";
/// Score stored with an unparsed verdict.
pub const UNPARSED_SCORE: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Absolute 1..=5 rating of a single response.
    #[default]
    Likert,
    /// Pairwise preference between two responses.
    Winrate,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Likert => "likert",
            Method::Winrate => "winrate",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One judged quality dimension, e.g. accuracy or appropriateness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// Filled from the map key when loaded from a definitions file.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub use_history: bool,
    /// Number of trailing turns shown to the judge. 0 keeps the full history.
    #[serde(default)]
    pub history_turns: usize,
    #[serde(default = "default_true")]
    pub use_knowledge: bool,
    /// Adjective used in pairwise verdict lines ("More appropriate response: 1").
    #[serde(default)]
    pub comparative: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Dimension {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            use_history: true,
            history_turns: 0,
            use_knowledge: true,
            comparative: None,
        }
    }

    pub fn comparative(&self) -> &str {
        self.comparative.as_deref().unwrap_or(&self.name)
    }

    /// First letter upper-cased, the rest lower-cased.
    pub fn capitalized_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect(),
            None => String::new(),
        }
    }
}

/// Turn history, knowledge and reference gathered for one dataset sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleContext {
    pub index: usize,
    pub reference: String,
    pub turns: Vec<String>,
    pub knowledge: Vec<String>,
}

/// One system output to be judged, with its dialogue context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DialogueSample {
    pub system_output: String,
    #[serde(default)]
    pub source: Vec<String>,
    #[serde(default)]
    pub context: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Human scores keyed by dimension, used for correlation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<usize>,
}

impl DialogueSample {
    /// Zip parallel output / history / knowledge lists into samples.
    pub fn from_lists(
        outputs: Vec<String>,
        sources: Vec<Vec<String>>,
        contexts: Vec<Vec<String>>,
    ) -> EvalResult<Vec<Self>> {
        check_len("source list", outputs.len(), sources.len())?;
        check_len("context list", outputs.len(), contexts.len())?;
        Ok(outputs
            .into_iter()
            .zip(sources)
            .zip(contexts)
            .map(|((system_output, source), context)| Self {
                system_output,
                source,
                context,
                ..Default::default()
            })
            .collect())
    }
}

impl From<(SampleContext, String)> for DialogueSample {
    fn from((ctx, system_output): (SampleContext, String)) -> Self {
        Self {
            system_output,
            source: ctx.turns,
            context: ctx.knowledge,
            reference: Some(ctx.reference),
            doc_id: Some(ctx.index),
            ..Default::default()
        }
    }
}

/// Two candidate responses for the same dialogue context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairwiseSample {
    pub source: Vec<String>,
    pub context: Vec<String>,
    pub response_1: String,
    pub response_2: String,
}

/// A parsed (or failed) judge verdict for one sample and dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: usize,
    pub dimension: String,
    pub score: f64,
    pub explanation: String,
    pub parsed: bool,
    /// True when the pairwise responses were shown to the judge in swapped order.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub swapped: bool,
}

impl ScoreRecord {
    pub fn unparsed(id: usize, dimension: impl Into<String>) -> Self {
        Self {
            id,
            dimension: dimension.into(),
            score: UNPARSED_SCORE,
            explanation: UNPARSED_EXPLANATION.to_string(),
            parsed: false,
            swapped: false,
        }
    }
}

/// All dimension scores for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SampleScores {
    /// Position in the judged subsample.
    pub id: usize,
    /// Dataset index of the sample, when it came from a collector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<usize>,
    pub scores: BTreeMap<String, f64>,
    pub explanations: BTreeMap<String, String>,
    /// Dimensions whose verdict could not be parsed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<f64>,
}

impl SampleScores {
    /// Mean over the parsed dimension scores.
    pub fn parsed_mean(&self) -> Option<f64> {
        let values: Vec<f64> = self
            .scores
            .iter()
            .filter(|(dim, _)| !self.failed.contains(dim))
            .map(|(_, v)| *v)
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> EvalResult<()> {
    if expected != actual {
        return Err(EvalError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
