//! Shared setup for the judging commands: dataset, predictions, judge and evaluator.

use crate::cli::args::{DatasetArgs, JudgeArgs};
use anyhow::Context;
use lleval_core::dataset::{load_predictions, select_samples};
use lleval_core::report::progress::console_progress_sink;
use lleval_core::{
    DataCollector, DialogEvaluator, DstcDataCollector, JudgeConfig, JudgeService, MetricConfig,
    Prediction, PromptScorer, PromptTemplate, SampleContext, TgiClient,
};
use std::path::Path;
use std::sync::Arc;

fn limit(n: usize) -> Option<usize> {
    (n > 0).then_some(n)
}

pub(crate) fn open_collector(args: &DatasetArgs) -> anyhow::Result<DstcDataCollector> {
    let collector = DstcDataCollector::open(&args.data_path, &args.split)
        .with_context(|| format!("failed to open dataset {}", args.data_path.display()))?
        .with_max_sentences(limit(args.max_sentences))
        .with_max_turns(limit(args.max_turns));
    tracing::info!(dataset = collector.name(), samples = collector.len(), "dataset loaded");
    Ok(collector)
}

/// Env settings (`LLEVAL_*`) with command-line flags on top.
pub(crate) fn judge_config(args: &JudgeArgs) -> anyhow::Result<JudgeConfig> {
    let mut config = JudgeConfig::from_env();
    if let Some(url) = &args.judge_url {
        config = config.with_url(url.clone());
    }
    if let Some(n) = args.num_retries {
        config = config.with_num_retries(n);
    }
    if let Some(n) = args.batch_size {
        config = config.with_batch_size(n);
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout_secs(secs);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.validate()?;
    Ok(config)
}

/// The given seed, else a fresh one that is logged so the run can be repeated.
pub(crate) fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(seed) => seed,
        None => {
            let seed = rand::random::<u64>();
            tracing::info!(seed, "no seed given; using a random one");
            seed
        }
    }
}

pub(crate) fn load_aligned_predictions(
    path: &Path,
    collector: &DstcDataCollector,
) -> anyhow::Result<Vec<Prediction>> {
    let preds = load_predictions(path)
        .with_context(|| format!("failed to load predictions {}", path.display()))?;
    if preds.len() != collector.len() {
        anyhow::bail!(
            "{} has {} entries but {} has {} labels",
            path.display(),
            preds.len(),
            collector.split_dir().display(),
            collector.len()
        );
    }
    Ok(preds)
}

/// Target samples every system responded to, optionally down-sampled.
pub(crate) fn collect_judged_contexts(
    collector: &DstcDataCollector,
    systems: &[&[Prediction]],
    num_samples: Option<usize>,
    seed: u64,
) -> anyhow::Result<Vec<SampleContext>> {
    let targets: Vec<usize> = collector
        .samples_with_target()
        .into_iter()
        .filter(|&i| systems.iter().all(|preds| preds[i].target))
        .collect();
    let picked = select_samples(&targets, num_samples, seed);
    tracing::info!(targets = targets.len(), picked = picked.len(), "samples selected");
    Ok(collector.collect_sample_contexts(&picked)?)
}

pub(crate) fn build_evaluator(
    args: &JudgeArgs,
    config: &JudgeConfig,
    order_seed: Option<u64>,
    total: usize,
) -> anyhow::Result<DialogEvaluator> {
    let template = PromptTemplate::load(&args.prompts)
        .with_context(|| format!("failed to load prompts {}", args.prompts.display()))?;
    let metric = match &args.metric_config {
        Some(path) => MetricConfig::load(path)
            .with_context(|| format!("failed to load metric config {}", path.display()))?,
        None => MetricConfig::default(),
    };

    let client = Arc::new(TgiClient::new(config)?);
    tracing::info!(url = client.url(), "judge endpoint");
    let judge = JudgeService::new(client, metric.gen_params, config.num_retries)
        .with_order_seed(order_seed);
    let progress = if args.quiet {
        None
    } else {
        console_progress_sink("judged", total)
    };
    let scorer = PromptScorer::new(judge, template, config.batch_size).with_progress(progress);
    Ok(DialogEvaluator::from_definitions_file(scorer, &args.dimensions)?)
}
