use crate::cli::args::CorrelateArgs;
use crate::exit_codes::SUCCESS;
use lleval_core::config::write_json;
use lleval_core::correlation::{correlate, render_correlation, sample_ratings, system_ratings};
use std::collections::BTreeMap;

pub fn run(args: CorrelateArgs) -> anyhow::Result<i32> {
    let sample_level = args.human_eval.len() == 1;
    let mut results = BTreeMap::new();
    for metric in &args.metrics {
        let rows = if sample_level {
            sample_ratings(&args.human_eval[0], metric)?
        } else {
            system_ratings(&args.human_eval, metric)?
        };
        let corr = correlate(&rows);
        println!("{}", render_correlation(metric, &corr));
        results.insert(metric.clone(), corr);
    }
    if let Some(path) = &args.output {
        write_json(path, &results)?;
    }
    Ok(SUCCESS)
}
