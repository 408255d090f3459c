use crate::config::load_document;
use crate::errors::{EvalError, EvalResult};
use crate::model::{DialogueSample, Dimension, Method, PairwiseSample, SampleScores, ScoreRecord};
use crate::scorer::PromptScorer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Likert results for a set of samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub method: Method,
    pub dimensions: Vec<String>,
    pub samples: Vec<SampleScores>,
}

/// Pairwise results for two systems over the same samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinrateReport {
    pub dimensions: Vec<String>,
    pub records: BTreeMap<String, Vec<ScoreRecord>>,
}

impl WinrateReport {
    /// Share of parsed verdicts won by system 1, or `None` when nothing parsed.
    pub fn win_rate(&self, dimension: &str) -> Option<f64> {
        let parsed: Vec<&ScoreRecord> = self
            .records
            .get(dimension)?
            .iter()
            .filter(|r| r.parsed)
            .collect();
        if parsed.is_empty() {
            return None;
        }
        let wins = parsed.iter().filter(|r| r.score == 1.0).count();
        Some(wins as f64 / parsed.len() as f64)
    }

    pub fn failures(&self, dimension: &str) -> usize {
        self.records
            .get(dimension)
            .map(|rs| rs.iter().filter(|r| !r.parsed).count())
            .unwrap_or(0)
    }
}

pub struct DialogEvaluator {
    scorer: PromptScorer,
    dimensions: BTreeMap<String, Dimension>,
}

impl DialogEvaluator {
    pub fn new(scorer: PromptScorer, dimensions: BTreeMap<String, Dimension>) -> Self {
        Self { scorer, dimensions }
    }

    /// Load dimension definitions (name -> definition) from JSON or YAML.
    pub fn from_definitions_file(scorer: PromptScorer, path: &Path) -> EvalResult<Self> {
        if !path.exists() {
            return Err(EvalError::config(format!(
                "dimension definitions file not found: {}",
                path.display()
            )));
        }
        let mut dimensions: BTreeMap<String, Dimension> = load_document(path)?;
        for (key, dim) in dimensions.iter_mut() {
            if dim.name.is_empty() {
                dim.name = key.clone();
            }
        }
        Ok(Self::new(scorer, dimensions))
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }

    fn resolve(&self, dims: Option<&[String]>) -> EvalResult<Vec<&Dimension>> {
        match dims {
            None => Ok(self.dimensions.values().collect()),
            Some(names) => names
                .iter()
                .map(|name| {
                    self.dimensions
                        .get(name)
                        .ok_or_else(|| EvalError::UnknownDimension {
                            name: name.clone(),
                            available: self
                                .dimensions
                                .keys()
                                .cloned()
                                .collect::<Vec<_>>()
                                .join(", "),
                        })
                })
                .collect(),
        }
    }

    /// Score every sample on the requested dimensions (all when `dims` is `None`).
    pub async fn evaluate(
        &self,
        samples: &[DialogueSample],
        dims: Option<&[String]>,
        overall: bool,
    ) -> EvalResult<EvalReport> {
        let dimensions = self.resolve(dims)?;
        let mut scores: Vec<SampleScores> = samples
            .iter()
            .enumerate()
            .map(|(id, sample)| SampleScores {
                id,
                doc_id: sample.doc_id,
                ..Default::default()
            })
            .collect();

        for dim in &dimensions {
            info!("Evaluating {} of {} samples", dim.name, samples.len());
            let records = self.scorer.score(samples, dim).await?;
            for record in records {
                let entry = &mut scores[record.id];
                if !record.parsed {
                    entry.failed.push(record.dimension.clone());
                }
                entry.scores.insert(record.dimension.clone(), record.score);
                entry.explanations.insert(record.dimension, record.explanation);
            }
        }

        if overall {
            for entry in scores.iter_mut() {
                entry.overall = entry.parsed_mean();
            }
        }

        Ok(EvalReport {
            method: Method::Likert,
            dimensions: dimensions.iter().map(|d| d.name.clone()).collect(),
            samples: scores,
        })
    }

    /// Pairwise-judge system 1 against system 2 on the requested dimensions.
    pub async fn compare(
        &self,
        pairs: &[PairwiseSample],
        dims: Option<&[String]>,
    ) -> EvalResult<WinrateReport> {
        let dimensions = self.resolve(dims)?;
        let mut records = BTreeMap::new();
        for dim in &dimensions {
            info!("Comparing {} on {} pairs", dim.name, pairs.len());
            records.insert(dim.name.clone(), self.scorer.score_pairwise(pairs, dim).await?);
        }
        Ok(WinrateReport {
            dimensions: dimensions.iter().map(|d| d.name.clone()).collect(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::JudgeService;
    use crate::model::UNPARSED_SCORE;
    use crate::prompt::PromptTemplate;
    use crate::providers::llm::fake::FakeClient;
    use std::sync::Arc;

    fn template() -> PromptTemplate {
        PromptTemplate {
            init_prompt: String::new(),
            task_prompt: String::new(),
            context_prompt: String::new(),
            candidate_prompt: "{}".into(),
            eval_prompt: String::new(),
            post_prompt: String::new(),
            pairwise: BTreeMap::from([("accuracy".to_string(), "{}{}{}".to_string())]),
        }
    }

    fn evaluator(client: FakeClient) -> DialogEvaluator {
        let judge = JudgeService::new(Arc::new(client), serde_json::json!({}), 1);
        let scorer = PromptScorer::new(judge, template(), 1);
        let dims = BTreeMap::from([
            ("accuracy".to_string(), Dimension::new("accuracy", "")),
            ("appropriateness".to_string(), Dimension::new("appropriateness", "")),
        ]);
        DialogEvaluator::new(scorer, dims)
    }

    fn samples(n: usize) -> Vec<DialogueSample> {
        (0..n)
            .map(|i| DialogueSample {
                system_output: format!("out {}", i),
                ..Default::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn overall_is_mean_of_parsed_dimensions() {
        // batch_size 1 keeps the scripted order: accuracy first, then appropriateness.
        let client = FakeClient::new().with_script([
            "a\nAccuracy Score: 4",
            "b\nAccuracy Score: 2",
            "c\nAppropriateness Score: 5",
            "garbled",
        ]);
        let report = evaluator(client).evaluate(&samples(2), None, true).await.unwrap();

        assert_eq!(report.dimensions, vec!["accuracy", "appropriateness"]);
        assert_eq!(report.samples[0].scores["accuracy"], 4.0);
        assert_eq!(report.samples[0].overall, Some(4.5));
        assert_eq!(report.samples[1].scores["appropriateness"], UNPARSED_SCORE);
        assert_eq!(report.samples[1].failed, vec!["appropriateness"]);
        assert_eq!(report.samples[1].overall, Some(2.0));
        assert_eq!(report.samples[0].explanations["appropriateness"], "c");
    }

    #[tokio::test]
    async fn scores_keep_the_dataset_index() {
        let client = FakeClient::new().with_response("fine\nAccuracy Score: 3");
        let subsample: Vec<DialogueSample> = [12, 4]
            .into_iter()
            .map(|doc_id| DialogueSample {
                system_output: "out".into(),
                doc_id: Some(doc_id),
                ..Default::default()
            })
            .collect();
        let report = evaluator(client)
            .evaluate(&subsample, Some(&["accuracy".to_string()]), false)
            .await
            .unwrap();
        let ids: Vec<(usize, Option<usize>)> =
            report.samples.iter().map(|s| (s.id, s.doc_id)).collect();
        assert_eq!(ids, vec![(0, Some(12)), (1, Some(4))]);
    }

    #[tokio::test]
    async fn unknown_dimension_is_rejected() {
        let err = evaluator(FakeClient::new())
            .evaluate(&samples(1), Some(&["fluency".to_string()]), false)
            .await
            .unwrap_err();
        match err {
            EvalError::UnknownDimension { name, available } => {
                assert_eq!(name, "fluency");
                assert_eq!(available, "accuracy, appropriateness");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn win_rate_ignores_unparsed_verdicts() {
        let client = FakeClient::new().with_script([
            "x\nMore accuracy response: 1",
            "x\nMore accuracy response: 2",
            "no idea",
        ]);
        let pairs: Vec<PairwiseSample> = (0..3)
            .map(|i| PairwiseSample {
                source: vec![],
                context: vec![],
                response_1: format!("a{}", i),
                response_2: format!("b{}", i),
            })
            .collect();
        let report = evaluator(client)
            .compare(&pairs, Some(&["accuracy".to_string()]))
            .await
            .unwrap();
        assert_eq!(report.win_rate("accuracy"), Some(0.5));
        assert_eq!(report.failures("accuracy"), 1);
        assert_eq!(report.win_rate("appropriateness"), None);
    }

    #[test]
    fn missing_definitions_file_is_a_config_error() {
        let judge = JudgeService::new(Arc::new(FakeClient::new()), serde_json::json!({}), 1);
        let scorer = PromptScorer::new(judge, template(), 1);
        let res = DialogEvaluator::from_definitions_file(scorer, Path::new("/nonexistent/dims.json"));
        assert!(matches!(res, Err(EvalError::Config { .. })));
    }
}
