//! N-gram statistical language model with pluggable smoothing.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Sentence-start sentinel. Its unigram count is the number of training
/// sentences, and it is excluded from ranking output.
pub const START: &str = "<s>";

/// Smoothing strategy applied when turning raw counts into probabilities.
///
/// The three variants correspond to the three generations of the scoring
/// function. `KneserNey` with discount 0.6 is the default; the Laplace
/// variants remain selectable because `KneserNey { discount: 0.0 }` is not
/// the same distribution (no add-one mass).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum Smoothing {
    /// Add-one smoothed bigram: ln((c(prev, w) + 1) / (c(prev) + V)).
    LaplaceBigram,
    /// Fixed-weight interpolation (0.7 / 0.3) of add-one trigram and bigram
    /// estimates; pure bigram when only one context token exists.
    LaplaceTrigram,
    /// Absolute-discount interpolation over trigram, bigram, and
    /// continuation-count unigram estimates with per-query lambdas.
    KneserNey { discount: f64 },
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::KneserNey { discount: 0.6 }
    }
}

/// Explicit serialized form of a trained model.
///
/// Enumerates exactly the four count tables (rather than dumping internal
/// state wholesale) so the persisted JSON document is a stable contract.
/// `unigrams` is kept in vocabulary first-seen order, which is enough to
/// restore deterministic ranking; the higher-order tables are sorted so the
/// written document is reproducible byte for byte.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelState {
    pub filter_stopwords: bool,
    pub unigrams: Vec<(String, u64)>,
    pub bigrams: Vec<(String, String, u64)>,
    pub trigrams: Vec<(String, String, String, u64)>,
    pub continuations: Vec<(String, u64)>,
}

/// Word-level n-gram model: raw co-occurrence counts at 1/2/3-word
/// granularity plus Kneser-Ney continuation counts.
///
/// Counts are keyed by owned tuples, never by separator-joined strings, so a
/// token containing any particular byte cannot collide with a composite key.
/// Scoring is read-only; `train` is the single writer and fully rebuilds
/// every table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NGramModel {
    /// token -> occurrence count; always contains `<s>`
    unigrams: HashMap<String, u64>,

    /// (prev, token) -> occurrence count
    bigrams: HashMap<(String, String), u64>,

    /// (prev_prev, prev, token) -> occurrence count
    trigrams: HashMap<(String, String, String), u64>,

    /// token -> number of distinct left contexts, N1+(•, w)
    continuations: HashMap<String, u64>,

    /// tokens in first-seen order (`<s>` first); ranking tie-break order
    vocab: Vec<String>,
}

impl NGramModel {
    /// Create an empty model containing only the `<s>` sentinel.
    pub fn new() -> Self {
        let mut unigrams = HashMap::new();
        unigrams.insert(START.to_string(), 0);
        Self {
            unigrams,
            bigrams: HashMap::new(),
            trigrams: HashMap::new(),
            continuations: HashMap::new(),
            vocab: vec![START.to_string()],
        }
    }

    /// Vocabulary size, counting the `<s>` sentinel.
    pub fn vocab_size(&self) -> usize {
        self.unigrams.len()
    }

    /// Number of distinct bigram types.
    pub fn bigram_types(&self) -> usize {
        self.bigrams.len()
    }

    /// Number of distinct trigram types.
    pub fn trigram_types(&self) -> usize {
        self.trigrams.len()
    }

    /// Occurrence count for a token (0 if unseen).
    pub fn unigram_count(&self, w: &str) -> u64 {
        self.unigrams.get(w).copied().unwrap_or(0)
    }

    /// Occurrence count for a (prev, token) pair.
    pub fn bigram_count(&self, w1: &str, w2: &str) -> u64 {
        self.bigrams
            .get(&(w1.to_string(), w2.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Occurrence count for a (prev_prev, prev, token) triple.
    pub fn trigram_count(&self, w1: &str, w2: &str, w3: &str) -> u64 {
        self.trigrams
            .get(&(w1.to_string(), w2.to_string(), w3.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct left contexts observed for a token.
    pub fn continuation_count(&self, w: &str) -> u64 {
        self.continuations.get(w).copied().unwrap_or(0)
    }

    /// Rebuild all count tables from tokenized sentences.
    ///
    /// Counts are reset first; training is never incremental. Each non-empty
    /// sentence bumps the `<s>` count, then a two-token lookback window walks
    /// the sentence updating unigram, bigram, and (once two prior tokens
    /// exist) trigram counts. Continuation counts are derived afterwards from
    /// the distinct bigram key set: continuation[w] = |{u : c(u, w) > 0}|.
    pub fn train(&mut self, sentences: &[Vec<String>]) {
        self.reset();

        for sentence in sentences {
            if sentence.is_empty() {
                continue;
            }

            *self.unigrams.entry(START.to_string()).or_insert(0) += 1;

            let mut prev = START.to_string();
            let mut prev_prev: Option<String> = None;

            for token in sentence {
                if !self.unigrams.contains_key(token) {
                    self.vocab.push(token.clone());
                }
                *self.unigrams.entry(token.clone()).or_insert(0) += 1;
                *self
                    .bigrams
                    .entry((prev.clone(), token.clone()))
                    .or_insert(0) += 1;
                if let Some(pp) = &prev_prev {
                    *self
                        .trigrams
                        .entry((pp.clone(), prev.clone(), token.clone()))
                        .or_insert(0) += 1;
                }
                // `<s>` never becomes a trigram left context; the window
                // only fills once two real sentence tokens have passed.
                let old = std::mem::replace(&mut prev, token.clone());
                if old != START {
                    prev_prev = Some(old);
                }
            }
        }

        // Each bigram key is already a distinct (left, right) type, so one
        // increment per key counts distinct left contexts exactly.
        for (_, w2) in self.bigrams.keys() {
            *self.continuations.entry(w2.clone()).or_insert(0) += 1;
        }

        tracing::info!(
            sentences = self.unigram_count(START),
            vocab = self.vocab_size(),
            bigrams = self.bigrams.len(),
            trigrams = self.trigrams.len(),
            "trained n-gram model"
        );
    }

    fn reset(&mut self) {
        self.unigrams.clear();
        self.unigrams.insert(START.to_string(), 0);
        self.bigrams.clear();
        self.trigrams.clear();
        self.continuations.clear();
        self.vocab.clear();
        self.vocab.push(START.to_string());
    }

    /// Log-probability of `candidate` following (`prev_prev`, `prev`) under
    /// the given smoothing strategy.
    ///
    /// Returns `f64::NEG_INFINITY` when the smoothed probability is not
    /// positive; that is a sentinel meaning "impossible", never an error.
    /// Zero denominators contribute zero rather than faulting.
    pub fn score(
        &self,
        prev_prev: Option<&str>,
        prev: &str,
        candidate: &str,
        smoothing: Smoothing,
    ) -> f64 {
        let v = self.vocab_size() as f64;

        match smoothing {
            Smoothing::LaplaceBigram => {
                let c2 = self.bigram_count(prev, candidate) as f64;
                let c1 = self.unigram_count(prev) as f64;
                ((c2 + 1.0) / (c1 + v)).ln()
            }
            Smoothing::LaplaceTrigram => {
                let c2 = self.bigram_count(prev, candidate) as f64;
                let c1 = self.unigram_count(prev) as f64;
                let lap2 = (c2 + 1.0) / (c1 + v);

                let p = match prev_prev {
                    Some(pp) => {
                        let c3 = self.trigram_count(pp, prev, candidate) as f64;
                        let c2_ctx = self.bigram_count(pp, prev) as f64;
                        let lap3 = (c3 + 1.0) / (c2_ctx + v);
                        0.7 * lap3 + 0.3 * lap2
                    }
                    None => lap2,
                };
                p.ln()
            }
            Smoothing::KneserNey { discount } => {
                let c3 = match prev_prev {
                    Some(pp) => self.trigram_count(pp, prev, candidate),
                    None => 0,
                };
                let tri = match prev_prev {
                    Some(pp) => {
                        let denom = self.bigram_count(pp, prev) as f64;
                        if denom > 0.0 {
                            (c3 as f64 - discount).max(0.0) / denom
                        } else {
                            0.0
                        }
                    }
                    None => 0.0,
                };

                let c2 = self.bigram_count(prev, candidate);
                let denom = self.unigram_count(prev) as f64;
                let bi = if denom > 0.0 {
                    (c2 as f64 - discount).max(0.0) / denom
                } else {
                    0.0
                };

                let uni = self.continuation_count(candidate) as f64 / v;

                let lambda1 = if c3 > 0 { 0.7 } else { 0.4 };
                let lambda2 = if c2 > 0 { 0.2 } else { 0.3 };

                let p = lambda1 * tri + lambda2 * bi + (1.0 - lambda1 - lambda2) * uni;
                if p > 0.0 {
                    p.ln()
                } else {
                    f64::NEG_INFINITY
                }
            }
        }
    }

    /// Rank every vocabulary token (except `<s>`) as a continuation of the
    /// given context.
    ///
    /// Only the last one or two context tokens matter; `<s>` stands in for
    /// the previous token when the context is empty. Returns the full
    /// ranking sorted by score descending; the sort is stable, so ties keep
    /// vocabulary first-seen order. Truncation to top-K is the caller's job.
    pub fn rank(&self, context: &[String], smoothing: Smoothing) -> Vec<(String, f64)> {
        let prev = context.last().map(String::as_str).unwrap_or(START);
        let prev_prev = if context.len() >= 2 {
            Some(context[context.len() - 2].as_str())
        } else {
            None
        };

        let mut ranked: Vec<(String, f64)> = Vec::with_capacity(self.vocab.len());
        for word in &self.vocab {
            if word == START {
                continue;
            }
            let score = self.score(prev_prev, prev, word, smoothing);
            ranked.push((word.clone(), score));
        }

        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    /// Export the full internal state as an explicit record.
    ///
    /// `filter_stopwords` records how the training corpus was tokenized so a
    /// loaded model is queried with the same filter.
    pub fn to_state(&self, filter_stopwords: bool) -> ModelState {
        let unigrams = self
            .vocab
            .iter()
            .map(|w| (w.clone(), self.unigram_count(w)))
            .collect();

        let mut bigrams: Vec<(String, String, u64)> = self
            .bigrams
            .iter()
            .map(|((w1, w2), &c)| (w1.clone(), w2.clone(), c))
            .collect();
        bigrams.sort();

        let mut trigrams: Vec<(String, String, String, u64)> = self
            .trigrams
            .iter()
            .map(|((w1, w2, w3), &c)| (w1.clone(), w2.clone(), w3.clone(), c))
            .collect();
        trigrams.sort();

        let mut continuations: Vec<(String, u64)> = self
            .continuations
            .iter()
            .map(|(w, &c)| (w.clone(), c))
            .collect();
        continuations.sort();

        ModelState {
            filter_stopwords,
            unigrams,
            bigrams,
            trigrams,
            continuations,
        }
    }

    /// Replace internal state wholesale from a record; no partial merge.
    pub fn from_state(state: &ModelState) -> Self {
        let mut vocab: Vec<String> = state.unigrams.iter().map(|(w, _)| w.clone()).collect();
        if !vocab.iter().any(|w| w == START) {
            vocab.insert(0, START.to_string());
        }

        let mut unigrams: HashMap<String, u64> = state.unigrams.iter().cloned().collect();
        unigrams.entry(START.to_string()).or_insert(0);

        Self {
            unigrams,
            bigrams: state
                .bigrams
                .iter()
                .map(|(w1, w2, c)| ((w1.clone(), w2.clone()), *c))
                .collect(),
            trigrams: state
                .trigrams
                .iter()
                .map(|(w1, w2, w3, c)| ((w1.clone(), w2.clone(), w3.clone()), *c))
                .collect(),
            continuations: state.continuations.iter().cloned().collect(),
            vocab,
        }
    }

    // --- Serialization helpers ---

    /// Save the model to the given path using bincode.
    pub fn save_bincode<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)?;
        Ok(())
    }

    /// Load the model from a bincode file.
    pub fn load_bincode<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let model: Self = bincode::deserialize_from(reader)?;
        Ok(model)
    }
}

impl Default for NGramModel {
    fn default() -> Self {
        Self::new()
    }
}
