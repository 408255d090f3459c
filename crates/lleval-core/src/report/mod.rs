pub mod progress;
pub mod reformat;

use crate::config::write_json;
use crate::errors::EvalResult;
use crate::evaluator::{EvalReport, WinrateReport};
use crate::model::{Method, SampleScores};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSummary {
    /// Mean Likert score, or system-1 win rate for pairwise runs.
    pub value: Option<f64>,
    pub scored: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub method: Method,
    pub generated_at: String,
    pub samples: usize,
    pub dimensions: BTreeMap<String, DimensionSummary>,
}

/// Per-dimension means over parsed scores, plus `overall` when computed.
pub fn dimension_averages(report: &EvalReport) -> BTreeMap<String, DimensionSummary> {
    let mut out = BTreeMap::new();
    for dim in &report.dimensions {
        let mut values = Vec::new();
        let mut failed = 0;
        for s in &report.samples {
            if s.failed.contains(dim) {
                failed += 1;
            } else if let Some(v) = s.scores.get(dim) {
                values.push(*v);
            }
        }
        out.insert(
            dim.clone(),
            DimensionSummary {
                value: mean(&values),
                scored: values.len(),
                failed,
            },
        );
    }

    let overall: Vec<f64> = report.samples.iter().filter_map(|s| s.overall).collect();
    if !overall.is_empty() {
        out.insert(
            "overall".to_string(),
            DimensionSummary {
                value: mean(&overall),
                scored: overall.len(),
                failed: report.samples.len() - overall.len(),
            },
        );
    }
    out
}

pub fn winrate_summary(report: &WinrateReport) -> BTreeMap<String, DimensionSummary> {
    report
        .dimensions
        .iter()
        .map(|dim| {
            let total = report.records.get(dim).map(Vec::len).unwrap_or(0);
            let failed = report.failures(dim);
            (
                dim.clone(),
                DimensionSummary {
                    value: report.win_rate(dim),
                    scored: total - failed,
                    failed,
                },
            )
        })
        .collect()
}

/// Fold pairwise records into one entry per pair.
pub fn winrate_samples(report: &WinrateReport) -> Vec<SampleScores> {
    let n = report.records.values().map(Vec::len).max().unwrap_or(0);
    let mut samples: Vec<SampleScores> = (0..n)
        .map(|id| SampleScores {
            id,
            ..Default::default()
        })
        .collect();
    for records in report.records.values() {
        for r in records {
            let entry = &mut samples[r.id];
            if !r.parsed {
                entry.failed.push(r.dimension.clone());
            }
            entry.scores.insert(r.dimension.clone(), r.score);
            entry.explanations.insert(r.dimension.clone(), r.explanation.clone());
        }
    }
    samples
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn render_scores_table(summary: &BTreeMap<String, DimensionSummary>) -> String {
    const DIM_HEADER: &str = "Dimensions";
    let width = summary
        .keys()
        .map(String::len)
        .chain(std::iter::once(DIM_HEADER.len()))
        .max()
        .unwrap_or(DIM_HEADER.len());
    let rule = format!("+-{}-+-{}-+-{}-+", "-".repeat(width), "-".repeat(10), "-".repeat(6));

    let mut s = String::new();
    s.push_str(&rule);
    s.push('\n');
    s.push_str(&format!("| {:<width$} | {:^10} | {:^6} |\n", DIM_HEADER, "Score", "Failed"));
    s.push_str(&rule);
    s.push('\n');
    for (dim, d) in summary {
        let value = d
            .value
            .map(|v| format!("{:.6}", v))
            .unwrap_or_else(|| "n/a".to_string());
        s.push_str(&format!("| {:<width$} | {:>10} | {:>6} |\n", dim, value, d.failed));
    }
    s.push_str(&rule);
    s.push('\n');
    s
}

pub fn print_scores(summary: &BTreeMap<String, DimensionSummary>) {
    println!("\nEvaluation scores are shown below:");
    print!("{}", render_scores_table(summary));
}

pub fn print_explanations(samples: &[SampleScores]) {
    for s in samples {
        println!("Explanation of the score for sample {}:", s.id);
        for (dim, expl) in &s.explanations {
            println!("{}: {}", dim, expl);
        }
    }
}

/// `<stem>_<method>_avg_metrics.json` and `<stem>_<method>_acc_app_metrics.json`.
pub fn metrics_paths(pred_path: &Path, method: Method) -> (PathBuf, PathBuf) {
    let stem = pred_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("predictions");
    let dir = pred_path.parent().unwrap_or_else(|| Path::new(""));
    (
        dir.join(format!("{}_{}_avg_metrics.json", stem, method)),
        dir.join(format!("{}_{}_acc_app_metrics.json", stem, method)),
    )
}

fn save(
    pred_path: &Path,
    method: Method,
    dimensions: BTreeMap<String, DimensionSummary>,
    samples: &[SampleScores],
) -> EvalResult<(PathBuf, PathBuf)> {
    let (avg_path, samples_path) = metrics_paths(pred_path, method);
    let summary = MetricsSummary {
        method,
        generated_at: chrono::Utc::now().to_rfc3339(),
        samples: samples.len(),
        dimensions,
    };
    tracing::info!(path = %avg_path.display(), "saving metrics");
    write_json(&avg_path, &summary)?;
    write_json(&samples_path, samples)?;
    Ok((avg_path, samples_path))
}

pub fn save_likert(pred_path: &Path, report: &EvalReport) -> EvalResult<(PathBuf, PathBuf)> {
    save(pred_path, Method::Likert, dimension_averages(report), &report.samples)
}

pub fn save_winrate(pred_path: &Path, report: &WinrateReport) -> EvalResult<(PathBuf, PathBuf)> {
    save(
        pred_path,
        Method::Winrate,
        winrate_summary(report),
        &winrate_samples(report),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScoreRecord, UNPARSED_SCORE};
    use tempfile::tempdir;

    fn sample(id: usize, acc: f64, failed: bool) -> SampleScores {
        let mut s = SampleScores {
            id,
            ..Default::default()
        };
        s.scores.insert("accuracy".into(), acc);
        s.explanations.insert("accuracy".into(), "e".into());
        if failed {
            s.failed.push("accuracy".into());
        }
        s.overall = s.parsed_mean();
        s
    }

    fn report() -> EvalReport {
        EvalReport {
            method: Method::Likert,
            dimensions: vec!["accuracy".into()],
            samples: vec![sample(0, 4.0, false), sample(1, 2.0, false), sample(2, UNPARSED_SCORE, true)],
        }
    }

    #[test]
    fn averages_exclude_failed_samples() {
        let avg = dimension_averages(&report());
        assert_eq!(avg["accuracy"].value, Some(3.0));
        assert_eq!(avg["accuracy"].scored, 2);
        assert_eq!(avg["accuracy"].failed, 1);
        assert_eq!(avg["overall"].value, Some(3.0));
    }

    #[test]
    fn table_has_six_decimals() {
        let table = render_scores_table(&dimension_averages(&report()));
        assert!(table.contains("| accuracy   |   3.000000 |      1 |"));
        assert!(table.contains("Dimensions"));
    }

    #[test]
    fn metrics_paths_follow_prediction_stem() {
        let (avg, samples) = metrics_paths(Path::new("pred/val/rg.t5-base.json"), Method::Winrate);
        assert_eq!(avg, Path::new("pred/val/rg.t5-base_winrate_avg_metrics.json"));
        assert_eq!(samples, Path::new("pred/val/rg.t5-base_winrate_acc_app_metrics.json"));
    }

    #[test]
    fn save_likert_writes_both_files() {
        let dir = tempdir().unwrap();
        let pred = dir.path().join("sys.json");
        let (avg, samples) = save_likert(&pred, &report()).unwrap();

        let summary: MetricsSummary = serde_json::from_str(&std::fs::read_to_string(avg).unwrap()).unwrap();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.dimensions["accuracy"].value, Some(3.0));
        let saved: Vec<SampleScores> = serde_json::from_str(&std::fs::read_to_string(samples).unwrap()).unwrap();
        assert_eq!(saved, report().samples);
    }

    #[test]
    fn winrate_records_fold_per_pair() {
        let mut records = BTreeMap::new();
        records.insert(
            "accuracy".to_string(),
            vec![
                ScoreRecord {
                    id: 0,
                    dimension: "accuracy".into(),
                    score: 1.0,
                    explanation: "x".into(),
                    parsed: true,
                    swapped: false,
                },
                ScoreRecord::unparsed(1, "accuracy"),
            ],
        );
        let report = WinrateReport {
            dimensions: vec!["accuracy".into()],
            records,
        };
        let samples = winrate_samples(&report);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].scores["accuracy"], 1.0);
        assert_eq!(samples[1].failed, vec!["accuracy"]);

        let summary = winrate_summary(&report);
        assert_eq!(summary["accuracy"].value, Some(1.0));
        assert_eq!(summary["accuracy"].scored, 1);
    }
}
