//! Rank correlations between human ratings and judge scores.
//!
//! Human evaluation files sit next to the predictions as
//! `<stem>.human_eval.json`: one entry per dataset sample, `null` for samples
//! that were not rated, otherwise a map of metric to the list of annotator
//! ratings. Judge scores are read from `<stem>_likert_acc_app_metrics.json`.

use crate::config::load_document;
use crate::errors::{EvalError, EvalResult};
use crate::model::{check_len, SampleScores};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const HUMAN_EVAL_SUFFIX: &str = ".human_eval.json";

type HumanEntry = Option<BTreeMap<String, Vec<f64>>>;

/// One row of the correlation input: a system or a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingPair {
    pub label: String,
    pub human: f64,
    pub judge: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub n: usize,
    pub spearman: Option<f64>,
    pub kendall: Option<f64>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// 1-based ranks; tied values share the average of their positions.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            ranks[k] = rank;
        }
        i = j + 1;
    }
    ranks
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let mx = mean(x)?;
    let my = mean(y)?;
    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx * vy).sqrt())
}

pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Kendall's tau-b, which corrects for ties in either input.
pub fn kendall_tau_b(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len();
    let (mut concordant, mut discordant) = (0i64, 0i64);
    let (mut ties_x, mut ties_y) = (0i64, 0i64);
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 {
                ties_x += 1;
            }
            if dy == 0.0 {
                ties_y += 1;
            }
            if dx == 0.0 || dy == 0.0 {
                continue;
            }
            if (dx > 0.0) == (dy > 0.0) {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }
    let pairs = (n * (n - 1) / 2) as i64;
    let denom = ((pairs - ties_x) as f64 * (pairs - ties_y) as f64).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((concordant - discordant) as f64 / denom)
}

/// `<dir>/<stem>.human_eval.json` -> `<dir>/<stem>_likert_acc_app_metrics.json`.
pub fn judge_scores_path(human_eval_path: &Path) -> EvalResult<PathBuf> {
    let name = human_eval_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = name.strip_suffix(HUMAN_EVAL_SUFFIX).ok_or_else(|| {
        EvalError::config(format!(
            "human evaluation file must end with {}: {}",
            HUMAN_EVAL_SUFFIX,
            human_eval_path.display()
        ))
    })?;
    Ok(human_eval_path.with_file_name(format!("{}_likert_acc_app_metrics.json", stem)))
}

/// Per rated sample: the mean over annotators.
fn human_sample_means(entries: &[HumanEntry], metric: &str) -> Vec<f64> {
    entries
        .iter()
        .flatten()
        .filter_map(|e| e.get(metric).and_then(|ratings| mean(ratings)))
        .collect()
}

/// Per judged sample: the score, or `None` when the verdict failed to parse.
fn judge_sample_scores(entries: &[Option<SampleScores>], metric: &str) -> Vec<Option<f64>> {
    entries
        .iter()
        .map(|e| {
            e.as_ref()
                .filter(|s| !s.failed.iter().any(|d| d == metric))
                .and_then(|s| s.scores.get(metric).copied())
        })
        .collect()
}

fn load_pair(path: &Path) -> EvalResult<(Vec<HumanEntry>, Vec<Option<SampleScores>>)> {
    let human: Vec<HumanEntry> = load_document(path)?;
    let judge: Vec<Option<SampleScores>> = load_document(&judge_scores_path(path)?)?;
    Ok((human, judge))
}

/// Sample-level rows for one system. The k-th rated human entry is paired with
/// the k-th judged sample; samples the judge failed on are skipped.
pub fn sample_ratings(human_eval_path: &Path, metric: &str) -> EvalResult<Vec<RatingPair>> {
    let (human, judge) = load_pair(human_eval_path)?;
    let human = human_sample_means(&human, metric);
    let judge = judge_sample_scores(&judge, metric);
    check_len("judge scores", human.len(), judge.len())?;
    Ok(human
        .into_iter()
        .zip(judge)
        .enumerate()
        .filter_map(|(i, (h, j))| {
            j.map(|judge| RatingPair {
                label: i.to_string(),
                human: h,
                judge,
            })
        })
        .collect())
}

/// System-level rows: mean human rating (annotators, then samples) against
/// mean judge score, one row per human evaluation file.
pub fn system_ratings(human_eval_paths: &[PathBuf], metric: &str) -> EvalResult<Vec<RatingPair>> {
    let mut rows = Vec::with_capacity(human_eval_paths.len());
    for path in human_eval_paths {
        let (human, judge) = load_pair(path)?;
        let human_means = human_sample_means(&human, metric);
        let judge_scores: Vec<f64> = judge_sample_scores(&judge, metric).into_iter().flatten().collect();
        let label = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(HUMAN_EVAL_SUFFIX))
            .unwrap_or_default()
            .to_string();
        tracing::info!(
            system = %label,
            ratings = human_means.len(),
            judged = judge_scores.len(),
            "loaded system ratings"
        );
        match (mean(&human_means), mean(&judge_scores)) {
            (Some(human), Some(judge)) => rows.push(RatingPair { label, human, judge }),
            _ => tracing::warn!(system = %label, metric, "no usable ratings; system skipped"),
        }
    }
    Ok(rows)
}

pub fn correlate(rows: &[RatingPair]) -> Correlation {
    let human: Vec<f64> = rows.iter().map(|r| r.human).collect();
    let judge: Vec<f64> = rows.iter().map(|r| r.judge).collect();
    Correlation {
        n: rows.len(),
        spearman: spearman(&human, &judge),
        kendall: kendall_tau_b(&human, &judge),
    }
}

pub fn render_correlation(metric: &str, corr: &Correlation) -> String {
    let fmt = |v: Option<f64>| v.map(|v| format!("{:.6}", v)).unwrap_or_else(|| "n/a".into());
    let mut s = format!("{} correlations (n={})\n", metric, corr.n);
    s.push_str(&format!("{:<10} {:>12} {:>12}\n", "spearman", "human", "judge"));
    s.push_str(&format!("{:<10} {:>12} {:>12}\n", "human", fmt(Some(1.0)), fmt(corr.spearman)));
    s.push_str(&format!("{:<10} {:>12} {:>12}\n", "judge", fmt(corr.spearman), fmt(Some(1.0))));
    s.push_str(&format!("kendall tau-b: {}\n", fmt(corr.kendall)));
    s
}
