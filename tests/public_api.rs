use nerscore::{
    add_gold_column, evaluate, score, AbbreviationTable, Delimiter, DivByZeroStrat,
    EvaluationError, Evaluator, GoldField, Metric, RowCounts, ScoreSet, ScorerConfig,
    ScorerConfigBuilder, Table, TableError,
};
use std::path::PathBuf;

pub trait CloseEnough {
    fn are_close(&self, other: &Self, eps: f32) -> bool;
}

// NaN never equals itself, so undefined metrics are compared by definedness.
impl CloseEnough for ScoreSet {
    fn are_close(&self, other: &Self, eps: f32) -> bool {
        let metrics_are_close = Metric::REPORT_ORDER.into_iter().all(|m| {
            let (a, b) = (self.get(m), other.get(m));
            (a.is_nan() && b.is_nan()) || f32::abs(a - b) < eps
        });
        self.row == other.row && self.counts == other.counts && metrics_are_close
    }
}

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/annotations.csv")
}

#[test]
fn report_of_fixture_dataset() {
    let evaluator =
        Evaluator::from_path("SciSpacy", "Gold", fixture(), ScorerConfig::default()).unwrap();
    let expected_report = "Phrase Level Precision: 0.500
Phrase Level Recall: 0.375
Token Level Precision: 0.500
Token Level Recall: 0.375
Phrase Level F1: 0.417
Token Level F1: 0.417\n";
    assert_eq!(evaluator.report().to_string(), expected_report);
}

#[test]
fn rows_of_fixture_dataset() {
    let evaluator =
        Evaluator::from_path("SciSpacy", "Gold", fixture(), ScorerConfig::default()).unwrap();
    let sets: Vec<ScoreSet> = evaluator.scores().iter().collect();
    assert_eq!(sets.len(), 4);
    let expected = ScoreSet {
        row: 1,
        counts: RowCounts {
            phrases_in_output: 1,
            phrases_in_gold: 2,
            matched_phrases: 1,
            tokens_in_output: 1,
            tokens_in_gold: 2,
            matched_tokens: 1,
        },
        phrase_precision: 1.0,
        phrase_recall: 0.5,
        phrase_fscore: 0.6666667,
        token_precision: 1.0,
        token_recall: 0.5,
        token_fscore: 0.6666667,
    };
    assert!(sets[1].are_close(&expected, 1e-6));
    // Empty output under the default policy
    assert_eq!(sets[3].phrase_precision, 0.0);
    assert_eq!(sets[3].counts.phrases_in_output, 0);
}

#[test]
fn excluded_rows_are_left_out_of_the_mean() {
    let config = ScorerConfigBuilder::new()
        .division_by_zero(DivByZeroStrat::Exclude)
        .build();
    let evaluator = Evaluator::from_path("SciSpacy", "Gold", fixture(), config).unwrap();
    let report = evaluator.report();
    assert_eq!(report.support(Metric::PhrasePrecision), Some(3));
    assert_eq!(report.support(Metric::PhraseRecall), Some(4));
    assert_eq!(
        format!("{:.3}", report.get(Metric::PhrasePrecision).unwrap()),
        "0.667"
    );
    assert_eq!(
        format!("{:.3}", report.get(Metric::PhraseFScore).unwrap()),
        "0.556"
    );
}

#[test]
fn prepared_gold_with_comma_delimited_phrases() {
    let mut table = Table::from_path(fixture()).unwrap();
    add_gold_column(
        &mut table,
        "NER Ground Truth Names",
        "Prepared Gold",
        GoldField::Names,
        &AbbreviationTable::default(),
    )
    .unwrap();
    assert_eq!(
        table.column("Prepared Gold").unwrap(),
        vec!["fever, cough", "chest pain", "blood pressure", "nausea"]
    );
    let config = ScorerConfigBuilder::new()
        .phrase_delimiter(Delimiter::Char(','))
        .build();
    let evaluator = Evaluator::from_table("MetaMap", "Prepared Gold", table, config).unwrap();
    let report = evaluator.report();
    assert_eq!(report.get(Metric::PhraseRecall), Some(1.0));
    assert_eq!(
        format!("{:.3}", report.get(Metric::PhrasePrecision).unwrap()),
        "0.875"
    );
    assert_eq!(
        format!("{:.3}", report.get(Metric::TokenPrecision).unwrap()),
        "0.917"
    );
}

#[test]
fn missing_column_names_the_file() {
    let actual = Evaluator::from_path("cTAKES", "Gold", fixture(), ScorerConfig::default());
    match actual {
        Err(EvaluationError::Table(TableError::MissingColumn { column, origin })) => {
            assert_eq!(column, "cTAKES");
            assert!(origin.ends_with("annotations.csv"));
        }
        other => panic!("Expected a missing column, got {:?}", other),
    }
}

#[test]
fn export_appends_six_columns() {
    let evaluator =
        Evaluator::from_path("SciSpacy", "Gold", fixture(), ScorerConfig::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scored.csv");
    evaluator.export(&path).unwrap();
    let exported = Table::from_path(&path).unwrap();
    let headers = exported.headers();
    assert_eq!(
        &headers[headers.len() - 6..],
        [
            "PLP SciSpacy",
            "PLR SciSpacy",
            "Phrase F1 SciSpacy",
            "TLP SciSpacy",
            "TLR SciSpacy",
            "Token F1 SciSpacy"
        ]
    );
    assert_eq!(
        exported.column("PLR SciSpacy").unwrap(),
        vec!["1", "0.5", "0", "0"]
    );
    // Appending again overwrites the metric columns in place
    let mut again = exported.clone();
    again.append_scores("SciSpacy", evaluator.scores()).unwrap();
    assert_eq!(again.headers().len(), headers.len());
}

#[test]
fn exported_undefined_metrics_are_empty() {
    let config = ScorerConfigBuilder::new()
        .division_by_zero(DivByZeroStrat::Exclude)
        .build();
    let evaluator = Evaluator::from_path("SciSpacy", "Gold", fixture(), config).unwrap();
    let table = evaluator.table_with_scores().unwrap();
    assert_eq!(table.column("TLP SciSpacy").unwrap()[3], "");
    assert_eq!(table.column("TLR SciSpacy").unwrap()[3], "0");
}

#[test]
fn evaluate_matches_scores_aggregate() {
    let outputs = vec!["fever", "a b c", ""];
    let golds = vec!["fever cough", "c b a", "x"];
    let config = ScorerConfig::default();
    let report = evaluate(&outputs, &golds, &config).unwrap();
    assert_eq!(report, score(&outputs, &golds, &config).unwrap().aggregate());
}

#[test]
fn extra_cells_fail_the_load() {
    let actual = Table::from_reader("Gold,Out\nfever,fever,cough\n".as_bytes());
    match actual {
        Err(TableError::RowTooLong {
            row,
            expected,
            found,
            ..
        }) => assert_eq!((row, expected, found), (0, 2, 3)),
        other => panic!("Expected a row too long, got {:?}", other),
    }
}

#[test]
fn failed_load_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does_not_exist.csv");
    let actual = Evaluator::from_path("Out", "Gold", &path, ScorerConfig::default());
    match actual {
        Err(error @ EvaluationError::Table(TableError::Io { .. })) => {
            assert!(error.to_string().contains("does_not_exist.csv"), "{}", error)
        }
        other => panic!("Expected an io error, got {:?}", other),
    }
}
