use super::runner_builder::{
    build_evaluator, collect_judged_contexts, judge_config, load_aligned_predictions,
    open_collector, resolve_seed,
};
use crate::cli::args::EvaluateArgs;
use crate::exit_codes::{ALL_FAILED, SUCCESS};
use lleval_core::report::{dimension_averages, print_explanations, print_scores, save_likert};
use lleval_core::{DialogueSample, EvalReport};

pub async fn run(args: EvaluateArgs) -> anyhow::Result<i32> {
    let config = judge_config(&args.judge)?;
    let seed = resolve_seed(config.seed);
    let collector = open_collector(&args.dataset)?;
    let preds = load_aligned_predictions(&args.predictions, &collector)?;
    let contexts = collect_judged_contexts(&collector, &[&preds], args.dataset.num_samples, seed)?;

    let samples: Vec<DialogueSample> = contexts
        .into_iter()
        .map(|ctx| {
            let output = preds[ctx.index].response.clone();
            DialogueSample::from((ctx, output))
        })
        .collect();

    let evaluator = build_evaluator(&args.judge, &config, None, samples.len())?;
    let report = evaluator
        .evaluate(&samples, args.judge.dims.as_deref(), args.overall)
        .await?;

    print_scores(&dimension_averages(&report));
    if args.explain {
        print_explanations(&report.samples);
    }
    let (avg_path, samples_path) = save_likert(&args.predictions, &report)?;
    eprintln!("Saved {} and {}", avg_path.display(), samples_path.display());

    Ok(if all_failed(&report) { ALL_FAILED } else { SUCCESS })
}

fn all_failed(report: &EvalReport) -> bool {
    !report.samples.is_empty()
        && report
            .samples
            .iter()
            .all(|s| s.failed.len() == report.dimensions.len())
}
