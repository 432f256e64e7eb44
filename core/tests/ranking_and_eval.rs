// End-to-end checks for training, ranking, persistence, and MRR evaluation
// through the public API.

use libsuggest_core::{
    evaluate, load_corpus, load_eval_set, Config, EvalCase, NGramModel, Predictor, SampleSize,
    Smoothing, Stopwords,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

fn temp_path(tag: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "libsuggest_it_{}_{}",
        tag,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    path
}

fn write_file(path: &std::path::Path, contents: &str) {
    let mut f = std::fs::File::create(path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
}

fn no_filter_config() -> Config {
    Config {
        filter_stopwords: false,
        ..Config::default()
    }
}

#[test]
fn cat_corpus_ranks_seen_continuations_first() {
    let mut p = Predictor::new(no_filter_config());
    p.train(&[
        vec!["the".into(), "cat".into(), "sat".into()],
        vec!["the".into(), "cat".into(), "ran".into()],
    ]);

    let ranked = p.model.rank(
        &["the".to_string(), "cat".to_string()],
        p.config.smoothing,
    );

    // "sat" and "ran" were both observed after (the, cat); everything else
    // must score strictly lower
    let score_of = |w: &str| {
        ranked
            .iter()
            .find(|(word, _)| word == w)
            .map(|(_, s)| *s)
            .unwrap()
    };
    let floor = score_of("sat").min(score_of("ran"));
    for (word, score) in &ranked {
        if word != "sat" && word != "ran" {
            assert!(
                *score < floor,
                "{} ({}) should rank below seen continuations ({})",
                word,
                score,
                floor
            );
        }
    }
}

#[test]
fn cat_corpus_reciprocal_rank_at_least_half() {
    let mut p = Predictor::new(no_filter_config());
    p.train(&[
        vec!["the".into(), "cat".into(), "sat".into()],
        vec!["the".into(), "cat".into(), "ran".into()],
    ]);

    let cases = vec![EvalCase {
        context: "the cat".into(),
        expected: "sat".into(),
    }];
    let mut rng = StdRng::seed_from_u64(1);
    let mrr = evaluate(
        &p.model,
        p.config.smoothing,
        None,
        &cases,
        SampleSize::All,
        2,
        &mut rng,
    )
    .unwrap();

    // "sat" is at worst second among the top 2
    assert!(mrr >= 0.5);
    assert!(mrr <= 1.0);
}

#[test]
fn mrr_stays_within_bounds() {
    let mut p = Predictor::new(no_filter_config());
    p.train(&[vec!["a".into(), "b".into()], vec!["a".into(), "c".into()]]);

    let perfect = vec![
        EvalCase {
            context: "a".into(),
            expected: "b".into(),
        },
        EvalCase {
            context: "a".into(),
            expected: "b".into(),
        },
    ];
    let hopeless = vec![EvalCase {
        context: "a".into(),
        expected: "nope".into(),
    }];

    let mut rng = StdRng::seed_from_u64(2);
    let hi = evaluate(
        &p.model,
        p.config.smoothing,
        None,
        &perfect,
        SampleSize::All,
        10,
        &mut rng,
    )
    .unwrap();
    let lo = evaluate(
        &p.model,
        p.config.smoothing,
        None,
        &hopeless,
        SampleSize::All,
        10,
        &mut rng,
    )
    .unwrap();

    assert!((hi - 1.0).abs() < 1e-12);
    assert_eq!(lo, 0.0);
}

#[test]
fn json_model_round_trip_through_files() {
    let corpus_path = temp_path("corpus");
    write_file(&corpus_path, "the cat sat\nthe cat ran\na dog ran\n");
    let model_path = temp_path("model.json");

    let mut p = Predictor::new(no_filter_config());
    let sentences = p.train_file(&corpus_path).unwrap();
    assert_eq!(sentences, 3);
    p.save_model(&model_path).unwrap();

    let mut restored = Predictor::new(no_filter_config());
    restored.load_model(&model_path).unwrap();

    for phrase in ["", "the", "the cat", "a dog", "unseen words here"] {
        assert_eq!(p.suggest(phrase, 10), restored.suggest(phrase, 10));
    }

    std::fs::remove_file(&corpus_path).ok();
    std::fs::remove_file(&model_path).ok();
}

#[test]
fn saved_model_remembers_stopword_flag() {
    let model_path = temp_path("model_flag.json");

    let mut p = Predictor::new(Config::default());
    p.train(&[vec!["cat".into(), "sat".into()]]);
    p.save_model(&model_path).unwrap();

    let mut restored = Predictor::new(no_filter_config());
    restored.load_model(&model_path).unwrap();
    assert!(restored.config.filter_stopwords);
    // the restored predictor filters queries again
    assert_eq!(restored.suggest("the cat", 1)[0].0, "sat");

    std::fs::remove_file(&model_path).ok();
}

#[test]
fn bincode_round_trip_matches_json_path() {
    let mut model = NGramModel::new();
    model.train(&[
        vec!["the".into(), "cat".into(), "sat".into()],
        vec!["a".into(), "dog".into(), "ran".into()],
    ]);

    let path = temp_path("model.bin");
    model.save_bincode(&path).unwrap();
    let restored = NGramModel::load_bincode(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let ctx = vec!["the".to_string(), "cat".to_string()];
    assert_eq!(
        model.rank(&ctx, Smoothing::default()),
        restored.rank(&ctx, Smoothing::default())
    );
}

#[test]
fn stopword_only_corpus_trains_an_empty_model() {
    let corpus_path = temp_path("stop_corpus");
    write_file(&corpus_path, "the of and\nto in for\n");

    let sw = Stopwords::english();
    let sentences = load_corpus(&corpus_path, Some(&sw)).unwrap();
    std::fs::remove_file(&corpus_path).ok();

    // every line tokenizes to nothing and is dropped before training
    assert!(sentences.is_empty());

    let mut model = NGramModel::new();
    model.train(&sentences);
    assert_eq!(model.vocab_size(), 1);
    assert_eq!(model.unigram_count(libsuggest_core::START), 0);
}

#[test]
fn evaluation_pipeline_from_files() {
    let corpus_path = temp_path("pipeline_corpus");
    write_file(&corpus_path, "the cat sat\nthe cat ran\n");
    let eval_path = temp_path("pipeline_eval");
    write_file(&eval_path, "the cat\tsat\nbroken line\nthe cat\tran\n");

    let mut p = Predictor::new(no_filter_config());
    p.train_file(&corpus_path).unwrap();

    let cases = load_eval_set(&eval_path).unwrap();
    assert_eq!(cases.len(), 2);

    let mut rng = StdRng::seed_from_u64(3);
    let mrr = p
        .evaluate_file(&eval_path, SampleSize::All, &mut rng)
        .unwrap();
    // both expected words sit in the top two of the ranking
    assert!(mrr >= 0.5 && mrr <= 1.0);

    std::fs::remove_file(&corpus_path).ok();
    std::fs::remove_file(&eval_path).ok();
}

#[test]
fn smoothing_variants_are_selectable_through_config() {
    let corpus = vec![
        vec!["a".to_string(), "b".to_string()],
        vec!["a".to_string(), "c".to_string()],
    ];

    for smoothing in [
        Smoothing::LaplaceBigram,
        Smoothing::LaplaceTrigram,
        Smoothing::KneserNey { discount: 0.6 },
        Smoothing::KneserNey { discount: 0.0 },
    ] {
        let mut p = Predictor::new(Config {
            smoothing,
            filter_stopwords: false,
            ..Config::default()
        });
        p.train(&corpus);
        let suggestions = p.suggest("a", 3);
        assert!(!suggestions.is_empty(), "{:?} produced no ranking", smoothing);
        // seen continuations outrank the unseen "a"
        assert!(suggestions[0].0 == "b" || suggestions[0].0 == "c");
    }
}
