//! Re-index saved pairwise record files so position `i` holds pair `i`.

use crate::config::{load_document, write_json};
use crate::errors::{EvalError, EvalResult};
use crate::model::SampleScores;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const WINRATE_RECORDS_SUFFIX: &str = "winrate_acc_app_metrics.json";

/// Entries with any unparsed dimension become `None`; gaps in the id range too.
///
/// Input that already holds `None` slots is the re-indexed layout, whose
/// length is kept even when its trailing entries failed.
pub fn reindex(entries: Vec<Option<SampleScores>>) -> Vec<Option<SampleScores>> {
    let id_span = entries.iter().flatten().map(|e| e.id + 1).max().unwrap_or(0);
    let len = if entries.iter().any(Option::is_none) {
        id_span.max(entries.len())
    } else {
        id_span
    };
    let mut out: Vec<Option<SampleScores>> = vec![None; len];
    for entry in entries.into_iter().flatten() {
        let id = entry.id;
        out[id] = if entry.failed.is_empty() {
            Some(entry)
        } else {
            None
        };
    }
    out
}

/// Rewrite one record file in place. Already re-indexed files are accepted.
pub fn reformat_file(path: &Path) -> EvalResult<usize> {
    let entries: Vec<Option<SampleScores>> = load_document(path)?;
    let out = reindex(entries);
    let dropped = out.iter().filter(|e| e.is_none()).count();
    write_json(path, &out)?;
    tracing::info!(path = %path.display(), entries = out.len(), dropped, "reformatted");
    Ok(out.len())
}

/// Reformat every `*winrate_acc_app_metrics.json` below `dir`.
pub fn reformat_dir(dir: &Path) -> EvalResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(EvalError::config(format!(
            "not a directory: {}",
            dir.display()
        )));
    }
    let mut done = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            EvalError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_records = entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.ends_with(WINRATE_RECORDS_SUFFIX));
        if is_records {
            reformat_file(entry.path())?;
            done.push(entry.into_path());
        }
    }
    Ok(done)
}
