//! isquestion Trainer
//!
//! Offline producer of the vectorizer, reducer and classifier artifacts the
//! server loads, plus an evaluation report.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use isquestion_classifiers::TfIdfConfig;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

mod dataset;
mod report;
mod search;
mod smote;
mod split;
mod train;

use dataset::Corpus;
use search::ParamGrid;
use train::TrainOptions;

#[derive(Parser, Debug)]
#[command(name = "isquestion-train")]
#[command(about = "Train and evaluate the question classifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Also append log lines to this file
    #[arg(long, global = true, env = "ISQUESTION_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit all artifacts and write them with metrics.json
    Train(TrainArgs),

    /// Score saved artifacts on labeled corpora
    Evaluate(EvaluateArgs),
}

#[derive(clap::Args, Debug)]
struct CorpusArgs {
    /// Questions, one per line
    #[arg(long)]
    questions: PathBuf,

    /// Free prose, one document per line
    #[arg(long)]
    prose: PathBuf,

    /// Records read from each file
    #[arg(long, default_value_t = 10_000)]
    sample_size: usize,
}

#[derive(clap::Args, Debug)]
struct TrainArgs {
    #[command(flatten)]
    corpus: CorpusArgs,

    /// Fraction of samples held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    /// Seed for the split, SVD and oversampling
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Reduced feature dimensionality
    #[arg(long, default_value_t = 100)]
    components: usize,

    /// Hyperparameter grid
    #[arg(long, value_enum, default_value_t = GridChoice::Full)]
    grid: GridChoice,

    /// Cross-validation folds
    #[arg(long, default_value_t = 3)]
    folds: usize,

    /// Drop terms found in fewer documents
    #[arg(long, default_value_t = 1)]
    min_df: usize,

    /// Keep only the most frequent terms
    #[arg(long)]
    max_features: Option<usize>,

    /// Output artifact directory
    #[arg(short, long, default_value = "./artifacts")]
    out: PathBuf,
}

#[derive(clap::Args, Debug)]
struct EvaluateArgs {
    #[command(flatten)]
    corpus: CorpusArgs,

    /// Artifact directory to score
    #[arg(short, long, default_value = "./artifacts")]
    artifacts: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GridChoice {
    /// 27 combinations of n_estimators, learning_rate and max_depth
    Full,
    /// Library defaults only
    Quick,
}

impl From<GridChoice> for ParamGrid {
    fn from(choice: GridChoice) -> Self {
        match choice {
            GridChoice::Full => ParamGrid::full(),
            GridChoice::Quick => ParamGrid::quick(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_file.as_ref())?;

    match cli.command {
        Command::Train(args) => {
            let options = TrainOptions {
                questions: args.corpus.questions,
                prose: args.corpus.prose,
                sample_size: args.corpus.sample_size,
                test_size: args.test_size,
                seed: args.seed,
                components: args.components,
                grid: args.grid.into(),
                cv_folds: args.folds,
                vectorizer: TfIdfConfig {
                    min_df: args.min_df,
                    max_features: args.max_features,
                },
                out: args.out,
            };
            let metrics = train::run_train(&options)?;
            info!(
                out = %options.out.display(),
                accuracy = metrics.test.accuracy,
                "Artifacts written"
            );
        }
        Command::Evaluate(args) => {
            let corpus = Corpus::load(
                &args.corpus.questions,
                &args.corpus.prose,
                args.corpus.sample_size,
            )?;
            if corpus.is_empty() {
                bail!("evaluation corpus is empty");
            }
            let report = train::run_evaluate(&args.artifacts, &corpus)?;
            println!("{}", report);
        }
    }

    Ok(())
}

/// Initialize tracing/logging, optionally teeing into a file
fn init_tracing(verbose: bool, log_file: Option<&PathBuf>) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("isquestion=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("isquestion=info"))
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}
