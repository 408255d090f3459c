use super::runner_builder::{
    build_evaluator, collect_judged_contexts, judge_config, load_aligned_predictions,
    open_collector, resolve_seed,
};
use crate::cli::args::CompareArgs;
use crate::exit_codes::{ALL_FAILED, SUCCESS};
use lleval_core::report::{print_scores, save_winrate, winrate_summary};
use lleval_core::PairwiseSample;

pub async fn run(args: CompareArgs) -> anyhow::Result<i32> {
    let config = judge_config(&args.judge)?;
    let seed = resolve_seed(config.seed);
    let collector = open_collector(&args.dataset)?;
    let first = load_aligned_predictions(&args.predictions, &collector)?;
    let second = load_aligned_predictions(&args.against, &collector)?;
    let contexts =
        collect_judged_contexts(&collector, &[&first, &second], args.dataset.num_samples, seed)?;

    let pairs: Vec<PairwiseSample> = contexts
        .into_iter()
        .map(|ctx| PairwiseSample {
            response_1: first[ctx.index].response.clone(),
            response_2: second[ctx.index].response.clone(),
            source: ctx.turns,
            context: ctx.knowledge,
        })
        .collect();

    let evaluator = build_evaluator(&args.judge, &config, Some(seed), pairs.len())?;
    let report = evaluator.compare(&pairs, args.judge.dims.as_deref()).await?;

    println!(
        "Win rate of {} against {}:",
        args.predictions.display(),
        args.against.display()
    );
    let summary = winrate_summary(&report);
    print_scores(&summary);
    let (avg_path, samples_path) = save_winrate(&args.predictions, &report)?;
    eprintln!("Saved {} and {}", avg_path.display(), samples_path.display());

    let nothing_parsed = !pairs.is_empty() && summary.values().all(|d| d.scored == 0);
    Ok(if nothing_parsed { ALL_FAILED } else { SUCCESS })
}
