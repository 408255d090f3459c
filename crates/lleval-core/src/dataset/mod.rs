//! Dataset-specific collection of dialogue contexts.
//!
//! A collector turns sample indices into reference responses, turn histories
//! and knowledge lines. DSTC9 / DSTC11 knowledge-grounded dialogue is the
//! main implementation; the dummy collector serves smoke tests.

pub mod dstc;
pub mod dummy;

pub use dstc::DstcDataCollector;
pub use dummy::DummyDataCollector;

use crate::config::load_document;
use crate::errors::EvalResult;
use crate::model::SampleContext;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub trait DataCollector: Send + Sync {
    fn name(&self) -> &str;

    /// Collect contexts for the given indices, in the order given.
    fn collect_sample_contexts(&self, sample_indices: &[usize]) -> EvalResult<Vec<SampleContext>>;
}

/// One entry of a system's prediction file, aligned with labels.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub target: bool,
    #[serde(default)]
    pub response: String,
}

pub fn load_predictions(path: &Path) -> EvalResult<Vec<Prediction>> {
    load_document(path)
}

/// Pick `k` of `indices` at random (seeded), keeping their original order.
/// `None`, or a `k` at least as large as the input, keeps everything.
pub fn select_samples(indices: &[usize], k: Option<usize>, seed: u64) -> Vec<usize> {
    let Some(k) = k.filter(|k| *k < indices.len()) else {
        return indices.to_vec();
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = sample(&mut rng, indices.len(), k).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| indices[i]).collect()
}
