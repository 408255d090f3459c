use crate::cli::args::ReformatArgs;
use crate::exit_codes::SUCCESS;
use lleval_core::report::reformat::reformat_dir;

pub fn run(args: ReformatArgs) -> anyhow::Result<i32> {
    let done = reformat_dir(&args.dir)?;
    for path in &done {
        println!("reformatted {}", path.display());
    }
    if done.is_empty() {
        tracing::warn!(dir = %args.dir.display(), "no winrate record files found");
    }
    Ok(SUCCESS)
}
