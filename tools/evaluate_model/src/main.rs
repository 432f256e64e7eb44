use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use libsuggest_core::{Config, Predictor, SampleSize};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Train an n-gram next-word model on a corpus, persist it as JSON, and
/// score it against a held-out evaluation set with mean reciprocal rank.
#[derive(Parser)]
#[command(name = "evaluate_model", about = "Train and evaluate a next-word suggestion model")]
struct Args {
    /// Training corpus, one sentence per line
    #[arg(long, default_value = "data/data_train.txt")]
    corpus: PathBuf,

    /// Evaluation set, tab-separated `context<TAB>expected_word` lines
    #[arg(long, default_value = "data/data_test.txt")]
    eval: PathBuf,

    /// Where to write the serialized model
    #[arg(long, default_value = "autocompletion.json")]
    model_out: PathBuf,

    /// Suggestions considered per evaluation case
    #[arg(long, default_value_t = 10)]
    top_k: usize,

    /// Evaluate a random sample of this many cases instead of the whole set
    #[arg(long)]
    sample: Option<usize>,

    /// RNG seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Train and query without stopword filtering
    #[arg(long)]
    keep_stopwords: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_toml(path)
            .map_err(|e| anyhow::anyhow!("load config {}: {}", path.display(), e))?,
        None => Config::default(),
    };
    config.top_k = args.top_k;
    if args.keep_stopwords {
        config.filter_stopwords = false;
    }

    tracing::info!(
        corpus = %args.corpus.display(),
        eval = %args.eval.display(),
        top_k = args.top_k,
        "starting evaluation run"
    );

    let mut predictor = Predictor::new(config);
    let sentences = predictor
        .train_file(&args.corpus)
        .with_context(|| format!("train on {}", args.corpus.display()))?;
    println!(
        "trained on {} sentences, vocabulary of {} words",
        sentences,
        predictor.model.vocab_size()
    );

    predictor.save_model(&args.model_out)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sample = match args.sample {
        Some(n) => SampleSize::Count(n),
        None => SampleSize::All,
    };

    let mrr = predictor.evaluate_file(&args.eval, sample, &mut rng)?;

    println!(
        "{} {}",
        "MRR".bold(),
        format!("{:.4}", mrr).with(if mrr >= 0.5 {
            crossterm::style::Color::Green
        } else {
            crossterm::style::Color::Yellow
        })
    );
    Ok(())
}
