use crate::errors::{EvalError, EvalResult};
use crate::judge::JudgeService;
use crate::model::{DialogueSample, Dimension, PairwiseSample, ScoreRecord};
use crate::prompt::PromptTemplate;
use crate::report::progress::{ProgressEvent, ProgressSink};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;

/// Fans prompts out to the judge, at most `batch_size` in flight.
#[derive(Clone)]
pub struct PromptScorer {
    judge: JudgeService,
    template: Arc<PromptTemplate>,
    batch_size: usize,
    progress: Option<ProgressSink>,
}

impl PromptScorer {
    pub fn new(judge: JudgeService, template: PromptTemplate, batch_size: usize) -> Self {
        Self {
            judge,
            template: Arc::new(template),
            batch_size: batch_size.max(1),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Likert-score every sample on `dimension`; records are returned in input order.
    pub async fn score(
        &self,
        samples: &[DialogueSample],
        dimension: &Dimension,
    ) -> EvalResult<Vec<ScoreRecord>> {
        info!(dimension = %dimension.name, samples = samples.len(), "scoring");
        let dimension = Arc::new(dimension.clone());
        let jobs = samples.iter().cloned().enumerate().map(|(id, sample)| {
            let judge = self.judge.clone();
            let template = self.template.clone();
            let dimension = dimension.clone();
            async move { judge.rate(id, &dimension, &template, &sample).await }
        });
        self.run_bounded(jobs, samples.len()).await
    }

    /// Pairwise-judge every pair on `dimension`; records are returned in input order.
    pub async fn score_pairwise(
        &self,
        pairs: &[PairwiseSample],
        dimension: &Dimension,
    ) -> EvalResult<Vec<ScoreRecord>> {
        info!(dimension = %dimension.name, pairs = pairs.len(), "comparing");
        let dimension = Arc::new(dimension.clone());
        let jobs = pairs.iter().cloned().enumerate().map(|(id, pair)| {
            let judge = self.judge.clone();
            let template = self.template.clone();
            let dimension = dimension.clone();
            async move { judge.compare(id, &dimension, &template, &pair).await }
        });
        self.run_bounded(jobs, pairs.len()).await
    }

    async fn run_bounded<I, F>(&self, jobs: I, total: usize) -> EvalResult<Vec<ScoreRecord>>
    where
        I: Iterator<Item = F>,
        F: Future<Output = EvalResult<ScoreRecord>> + Send + 'static,
    {
        let sem = Arc::new(Semaphore::new(self.batch_size));
        let mut join_set = JoinSet::new();
        for job in jobs {
            let permit = sem.clone().acquire_owned().await.map_err(|e| EvalError::Internal {
                message: format!("scorer semaphore closed: {}", e),
            })?;
            join_set.spawn(async move {
                let _permit = permit;
                job.await
            });
        }

        let mut records = Vec::with_capacity(total);
        while let Some(res) = join_set.join_next().await {
            let record = res.map_err(|e| EvalError::Internal {
                message: format!("judge task failed: {}", e),
            })??;
            records.push(record);
            if let Some(ref sink) = self.progress {
                sink(ProgressEvent {
                    done: records.len(),
                    total,
                });
            }
        }

        // Completion order is arbitrary; restore input order.
        records.sort_by_key(|r| r.id);
        Ok(records)
    }
}
