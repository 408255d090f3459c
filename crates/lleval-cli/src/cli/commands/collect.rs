use super::runner_builder::{open_collector, resolve_seed};
use crate::cli::args::CollectArgs;
use crate::exit_codes::SUCCESS;
use anyhow::Context;
use lleval_core::config::write_json;
use lleval_core::dataset::select_samples;
use lleval_core::DataCollector;

pub fn run(args: CollectArgs) -> anyhow::Result<i32> {
    let collector = open_collector(&args.dataset)?;
    let targets = collector.samples_with_target();
    let picked = match args.dataset.num_samples {
        Some(k) => select_samples(&targets, Some(k), resolve_seed(args.seed)),
        None => targets,
    };
    let contexts = collector.collect_sample_contexts(&picked)?;
    write_json(&args.output, &contexts)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    eprintln!("Wrote {} samples to {}", contexts.len(), args.output.display());
    Ok(SUCCESS)
}
