//! Per-completion progress for judge runs, throttled on the console.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
}

/// Called once per completed prompt, in completion order.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

const PROGRESS_MIN_INTERVAL_MS: u64 = 500;

#[must_use]
pub fn format_progress_line(label: &str, done: usize, total: usize) -> String {
    let pct = if total == 0 { 100 } else { done * 100 / total };
    format!("{}: {}/{} ({}%)", label, done, total, pct)
}

pub(crate) fn progress_step(total: usize) -> usize {
    if total <= 20 {
        1
    } else {
        std::cmp::max(1, total / 20)
    }
}

/// Throttled sink printing to stderr; `None` for runs of a single prompt.
pub fn console_progress_sink(label: impl Into<String>, total: usize) -> Option<ProgressSink> {
    if total <= 1 {
        return None;
    }
    let label = label.into();
    let step = progress_step(total);
    let last_emit: Mutex<Option<Instant>> = Mutex::new(None);
    Some(Arc::new(move |ev: ProgressEvent| {
        let now = Instant::now();
        let emit = {
            let Ok(mut last) = last_emit.lock() else {
                return;
            };
            let interval_ok = last
                .map(|t| now.saturating_duration_since(t) >= Duration::from_millis(PROGRESS_MIN_INTERVAL_MS))
                .unwrap_or(true);
            let ok = ev.done == ev.total || (ev.done % step == 0 && interval_ok);
            if ok {
                *last = Some(now);
            }
            ok
        };
        if emit {
            eprintln!("{}", format_progress_line(&label, ev.done, ev.total));
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_shows_percentage() {
        assert_eq!(format_progress_line("accuracy", 5, 20), "accuracy: 5/20 (25%)");
        assert_eq!(format_progress_line("accuracy", 0, 0), "accuracy: 0/0 (100%)");
    }

    #[test]
    fn step_grows_with_total() {
        assert_eq!(progress_step(10), 1);
        assert_eq!(progress_step(400), 20);
    }

    #[test]
    fn single_prompt_runs_have_no_sink() {
        assert!(console_progress_sink("x", 1).is_none());
        assert!(console_progress_sink("x", 2).is_some());
    }
}
