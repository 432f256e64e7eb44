//! libsuggest-core
//!
//! Statistical next-word suggestion: n-gram counting, smoothed scoring,
//! ranking, JSON/bincode persistence, and mean-reciprocal-rank evaluation.
//!
//! Public API:
//! - `NGramModel` - unigram/bigram/trigram counts with pluggable smoothing
//! - `Smoothing` - Laplace bigram, Laplace trigram, or Kneser-Ney scoring
//! - `Stopwords` / `tokenize` - lowercase whitespace tokenization
//! - `EvalCase` / `evaluate` - held-out MRR evaluation with injectable RNG
//! - `Predictor` - model + config + stopwords glued together
//! - `Config` - configuration and TOML persistence
use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub mod ngram;
pub use ngram::{ModelState, NGramModel, Smoothing, START};

pub mod tokenize;
pub use tokenize::{tokenize, Stopwords};

pub mod eval;
pub use eval::{evaluate, load_corpus, load_eval_set, EvalCase, SampleSize};

/// Configuration for training and evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Scoring strategy; selects one of the three smoothing generations.
    pub smoothing: Smoothing,

    /// Drop stopwords from training sentences and query contexts.
    pub filter_stopwords: bool,

    /// Suggestions kept per query during evaluation.
    pub top_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            smoothing: Smoothing::default(),
            filter_stopwords: true,
            top_k: 10,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// High-level predictor combining the n-gram model, its configuration, and
/// the stopword set used for both training and query tokenization.
#[derive(Debug, Clone)]
pub struct Predictor {
    pub model: NGramModel,
    pub config: Config,
    stopwords: Option<Stopwords>,
}

impl Predictor {
    /// Create an untrained predictor; the English stopword list is attached
    /// when the config enables filtering.
    pub fn new(config: Config) -> Self {
        let stopwords = config.filter_stopwords.then(Stopwords::english);
        Self {
            model: NGramModel::new(),
            config,
            stopwords,
        }
    }

    /// Create a predictor with a custom stopword set (used only while
    /// `config.filter_stopwords` is on).
    pub fn with_stopwords(config: Config, stopwords: Stopwords) -> Self {
        Self {
            model: NGramModel::new(),
            config,
            stopwords: Some(stopwords),
        }
    }

    /// Stopword set applied to training and query tokens, if filtering is on.
    pub fn stopwords(&self) -> Option<&Stopwords> {
        if self.config.filter_stopwords {
            self.stopwords.as_ref()
        } else {
            None
        }
    }

    /// Train on already-tokenized sentences.
    pub fn train(&mut self, sentences: &[Vec<String>]) {
        self.model.train(sentences);
    }

    /// Train on a corpus file (one sentence per line); returns the number of
    /// sentences used.
    pub fn train_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let sentences = load_corpus(path, self.stopwords())?;
        self.model.train(&sentences);
        Ok(sentences.len())
    }

    /// Top `limit` next-word suggestions for a raw phrase.
    ///
    /// The phrase is tokenized like training input; the full vocabulary
    /// ranking is truncated here.
    pub fn suggest(&self, phrase: &str, limit: usize) -> Vec<(String, f64)> {
        let context = tokenize(phrase, self.stopwords());
        let mut ranked = self.model.rank(&context, self.config.smoothing);
        ranked.truncate(limit);
        ranked
    }

    /// Persist the trained model as a JSON state document.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let state = self.model.to_state(self.config.filter_stopwords);
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), &state)
            .with_context(|| format!("serialize model to {}", path.display()))?;
        tracing::info!(path = %path.display(), "saved model");
        Ok(())
    }

    /// Replace the model (and the stopword-filter flag) from a JSON state
    /// document written by `save_model`.
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let state: ModelState = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("deserialize model from {}", path.display()))?;

        self.model = NGramModel::from_state(&state);
        self.config.filter_stopwords = state.filter_stopwords;
        if self.config.filter_stopwords && self.stopwords.is_none() {
            self.stopwords = Some(Stopwords::english());
        }
        tracing::info!(path = %path.display(), vocab = self.model.vocab_size(), "loaded model");
        Ok(())
    }

    /// Load an evaluation file and compute MRR with this predictor's
    /// configuration.
    pub fn evaluate_file<P: AsRef<Path>, R: Rng>(
        &self,
        path: P,
        sample: SampleSize,
        rng: &mut R,
    ) -> Result<f64> {
        let cases = load_eval_set(path)?;
        evaluate(
            &self.model,
            self.config.smoothing,
            self.stopwords(),
            &cases,
            sample,
            self.config.top_k,
            rng,
        )
    }
}
