use super::args::*;

pub mod collect;
pub mod compare;
pub mod correlate;
pub mod evaluate;
pub mod reformat;
pub(crate) mod runner_builder;

use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Collect(args) => collect::run(args),
        Command::Evaluate(args) => evaluate::run(args).await,
        Command::Compare(args) => compare::run(args).await,
        Command::Correlate(args) => correlate::run(args),
        Command::Reformat(args) => reformat::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
