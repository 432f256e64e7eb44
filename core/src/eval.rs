//! Corpus loading and mean-reciprocal-rank evaluation.
use anyhow::{bail, Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::ngram::{NGramModel, Smoothing};
use crate::tokenize::{tokenize, Stopwords};

/// One held-out test case: a context phrase and the word expected to follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalCase {
    pub context: String,
    pub expected: String,
}

/// How many evaluation cases to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSize {
    /// Use the whole evaluation set in file order.
    All,
    /// Random sample without replacement.
    Count(usize),
}

/// Read a corpus file into tokenized sentences, one sentence per line.
///
/// Lines are lowercased and whitespace-split; stopwords are dropped when a
/// set is supplied; lines that tokenize to nothing are skipped entirely.
pub fn load_corpus<P: AsRef<Path>>(
    path: P,
    stopwords: Option<&Stopwords>,
) -> Result<Vec<Vec<String>>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open corpus {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut sentences = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let tokens = tokenize(&line, stopwords);
        if !tokens.is_empty() {
            sentences.push(tokens);
        }
    }

    tracing::info!(sentences = sentences.len(), path = %path.display(), "loaded corpus");
    Ok(sentences)
}

/// Read a tab-separated evaluation file: `context<TAB>expected_word`.
///
/// Lines are lowercased; lines with fewer than two fields are skipped
/// silently (the evaluation set is simply smaller, not an error).
pub fn load_eval_set<P: AsRef<Path>>(path: P) -> Result<Vec<EvalCase>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("open evaluation set {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut cases = Vec::new();
    for line in reader.lines() {
        let line = line?.trim().to_lowercase();
        let mut fields = line.split('\t');
        match (fields.next(), fields.next()) {
            (Some(context), Some(expected)) if !expected.is_empty() => {
                cases.push(EvalCase {
                    context: context.to_string(),
                    expected: expected.trim().to_string(),
                });
            }
            _ => continue,
        }
    }

    tracing::info!(cases = cases.len(), path = %path.display(), "loaded evaluation set");
    Ok(cases)
}

/// Mean reciprocal rank of the model over the evaluation cases.
///
/// For each sampled case the context is tokenized exactly like training
/// input, ranked, and truncated to `top_k`; a hit at 1-indexed position `i`
/// contributes `1/i`, a miss contributes 0. `SampleSize::Count` draws an
/// unordered sample without replacement from the injected `rng`, so a seeded
/// generator makes evaluation reproducible.
///
/// Returns `Ok(0.0)` for an empty selection (there is nothing to average),
/// and an error when asked to sample more cases than exist.
pub fn evaluate<R: Rng>(
    model: &NGramModel,
    smoothing: Smoothing,
    stopwords: Option<&Stopwords>,
    cases: &[EvalCase],
    sample: SampleSize,
    top_k: usize,
    rng: &mut R,
) -> Result<f64> {
    let selected: Vec<&EvalCase> = match sample {
        SampleSize::All => cases.iter().collect(),
        SampleSize::Count(n) => {
            if n > cases.len() {
                bail!(
                    "cannot sample {} cases from an evaluation set of {}",
                    n,
                    cases.len()
                );
            }
            cases.choose_multiple(rng, n).collect()
        }
    };

    if selected.is_empty() {
        return Ok(0.0);
    }

    let mut score = 0.0;
    for case in &selected {
        let context = tokenize(&case.context, stopwords);
        let ranked = model.rank(&context, smoothing);
        let hit = ranked
            .iter()
            .take(top_k)
            .position(|(word, _)| word == &case.expected);
        if let Some(pos) = hit {
            score += 1.0 / (pos + 1) as f64;
        }
        tracing::debug!(
            context = %case.context,
            expected = %case.expected,
            rank = ?hit.map(|p| p + 1),
            "evaluated case"
        );
    }

    Ok(score / selected.len() as f64)
}
