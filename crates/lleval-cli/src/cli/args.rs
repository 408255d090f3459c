use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lleval",
    version,
    about = "LLM-as-judge evaluation for knowledge-grounded dialogue systems"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write reference turns and knowledge for a dataset split to JSON
    Collect(CollectArgs),
    /// Likert-judge one system's predictions
    Evaluate(EvaluateArgs),
    /// Pairwise-judge two systems' predictions
    Compare(CompareArgs),
    /// Correlate saved judge scores with human ratings
    Correlate(CorrelateArgs),
    /// Re-index saved winrate record files by sample id
    Reformat(ReformatArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Dataset root holding one directory per split
    #[arg(long, env = "LLEVAL_DATA_PATH", default_value = "data/dstc11")]
    pub data_path: PathBuf,

    #[arg(long, default_value = "val")]
    pub split: String,

    /// Knowledge snippets kept per sample (0 keeps all)
    #[arg(long, default_value_t = 10)]
    pub max_sentences: usize,

    /// Trailing log turns kept per sample (0 keeps all)
    #[arg(long, default_value_t = 10)]
    pub max_turns: usize,

    /// Judge a random subset of this many target samples
    #[arg(long)]
    pub num_samples: Option<usize>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct JudgeArgs {
    /// Generation endpoint; overrides LLEVAL_JUDGE_URL
    #[arg(long)]
    pub judge_url: Option<String>,

    #[arg(long)]
    pub num_retries: Option<u32>,

    /// Prompts in flight at once
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seed for sample selection and pairwise order; random when unset
    #[arg(long)]
    pub seed: Option<u64>,

    /// Prompt template file (JSON or YAML)
    #[arg(long, default_value = "config/prompts.json")]
    pub prompts: PathBuf,

    /// Dimension definitions file (JSON or YAML)
    #[arg(long, default_value = "config/dimensions.json")]
    pub dimensions: PathBuf,

    /// Generation parameters file; built-in defaults when unset
    #[arg(long)]
    pub metric_config: Option<PathBuf>,

    /// Dimensions to judge, comma separated; all defined ones when unset
    #[arg(long, value_delimiter = ',')]
    pub dims: Option<Vec<String>>,

    /// Hide the progress lines on stderr
    #[arg(long)]
    pub quiet: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CollectArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, short)]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    #[command(flatten)]
    pub judge: JudgeArgs,

    /// Predictions file aligned with the split's labels.json
    #[arg(long)]
    pub predictions: PathBuf,

    /// Also report the per-sample mean over dimensions
    #[arg(long)]
    pub overall: bool,

    /// Print the judge's explanation for every sample
    #[arg(long)]
    pub explain: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    #[command(flatten)]
    pub judge: JudgeArgs,

    /// System 1 predictions; metrics are saved next to this file
    #[arg(long)]
    pub predictions: PathBuf,

    /// System 2 predictions
    #[arg(long)]
    pub against: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CorrelateArgs {
    /// `<stem>.human_eval.json` files; one file correlates samples, several correlate systems
    #[arg(required = true)]
    pub human_eval: Vec<PathBuf>,

    #[arg(long, value_delimiter = ',', default_value = "accuracy,appropriateness")]
    pub metrics: Vec<String>,

    /// Write the correlations as JSON
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReformatArgs {
    /// Directory searched recursively for `*winrate_acc_app_metrics.json`
    pub dir: PathBuf,
}
