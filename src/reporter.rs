/**
This modules gives a few tools to prettyprint the scores of every row and the averaged metrics.
*/
use crate::config::ParsingError;
use crate::metrics::RowCounts;
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Granularity of a metric: whole phrases or the tokens inside them.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Sequence, Serialize, Deserialize)]
pub enum Level {
    Phrase,
    Token,
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Enumeration of the six metrics computed for every row. The declaration order is the order of
/// the exported columns.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Sequence, Serialize, Deserialize)]
pub enum Metric {
    PhrasePrecision,
    PhraseRecall,
    PhraseFScore,
    TokenPrecision,
    TokenRecall,
    TokenFScore,
}

impl Metric {
    /// Order in which the aggregated metrics are printed.
    pub const REPORT_ORDER: [Metric; 6] = [
        Metric::PhrasePrecision,
        Metric::PhraseRecall,
        Metric::TokenPrecision,
        Metric::TokenRecall,
        Metric::PhraseFScore,
        Metric::TokenFScore,
    ];

    pub fn level(&self) -> Level {
        match self {
            Self::PhrasePrecision | Self::PhraseRecall | Self::PhraseFScore => Level::Phrase,
            Self::TokenPrecision | Self::TokenRecall | Self::TokenFScore => Level::Token,
        }
    }

    /// Short name used as the prefix of the exported columns.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::PhrasePrecision => "PLP",
            Self::PhraseRecall => "PLR",
            Self::PhraseFScore => "Phrase F1",
            Self::TokenPrecision => "TLP",
            Self::TokenRecall => "TLR",
            Self::TokenFScore => "Token F1",
        }
    }

    /// Name of the exported column holding this metric for the scored column `column`.
    pub fn column_name(&self, column: &str) -> String {
        format!("{} {}", self.abbreviation(), column)
    }

    /// Human readable label, used in the console report.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PhrasePrecision => "Phrase Level Precision",
            Self::PhraseRecall => "Phrase Level Recall",
            Self::PhraseFScore => "Phrase Level F1",
            Self::TokenPrecision => "Token Level Precision",
            Self::TokenRecall => "Token Level Recall",
            Self::TokenFScore => "Token Level F1",
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Metric {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all::<Metric>()
            .find(|m| {
                m.abbreviation().eq_ignore_ascii_case(s)
                    || m.label().eq_ignore_ascii_case(s)
                    || format!("{:?}", m).eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| ParsingError::new(s, "Metric"))
    }
}

/// Counts and metrics of a single row. Metrics left undefined by `DivByZeroStrat::Exclude` are
/// `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSet {
    pub row: usize,
    pub counts: RowCounts,
    pub phrase_precision: f32,
    pub phrase_recall: f32,
    pub phrase_fscore: f32,
    pub token_precision: f32,
    pub token_recall: f32,
    pub token_fscore: f32,
}

impl ScoreSet {
    /// Header line matching the `Display` of a `ScoreSet`.
    pub const HEADER: &'static str = "Row, PLP, PLR, Phrase F1, TLP, TLR, Token F1";

    pub fn get(&self, metric: Metric) -> f32 {
        match metric {
            Metric::PhrasePrecision => self.phrase_precision,
            Metric::PhraseRecall => self.phrase_recall,
            Metric::PhraseFScore => self.phrase_fscore,
            Metric::TokenPrecision => self.token_precision,
            Metric::TokenRecall => self.token_recall,
            Metric::TokenFScore => self.token_fscore,
        }
    }

    /// Is `metric` defined for this row? Only rows scored with `DivByZeroStrat::Exclude` can
    /// have undefined metrics.
    pub fn is_defined(&self, metric: Metric) -> bool {
        !self.get(metric).is_nan()
    }
}

/// The ScoreSet acts as a line in a dataframe when displayed.
impl Display for ScoreSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}, {}",
            self.row,
            self.phrase_precision,
            self.phrase_recall,
            self.phrase_fscore,
            self.token_precision,
            self.token_recall,
            self.token_fscore
        )
    }
}

/// Mean of a metric over the rows where it is defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateEntry {
    pub mean: f32,
    /// Number of rows included in the mean.
    pub support: usize,
}

/// The aggregate report holds the mean of every metric across all rows. It is derived on demand
/// from `Scores::aggregate` and prints the six summary lines when displayed.
///
/// # Example
///
/// ```rust
/// use nerscore::{score, Metric, ScorerConfig};
///
/// let outputs = vec!["fever cough", "fever", "headache"];
/// let golds = vec!["fever cough", "fever cough", "nausea"];
///
/// let scores = score(&outputs, &golds, &ScorerConfig::default()).unwrap();
/// let report = scores.aggregate();
///
/// let expected_report = "Phrase Level Precision: 0.667
/// Phrase Level Recall: 0.500
/// Token Level Precision: 0.667
/// Token Level Recall: 0.500
/// Phrase Level F1: 0.556
/// Token Level F1: 0.556\n";
///
/// assert_eq!(expected_report, report.to_string());
/// assert_eq!(report.support(Metric::PhraseFScore), Some(3));
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AggregateReport {
    pub(crate) metrics: BTreeMap<Metric, AggregateEntry>,
}

impl AggregateReport {
    pub(crate) fn insert(&mut self, metric: Metric, entry: AggregateEntry) -> Option<AggregateEntry> {
        self.metrics.insert(metric, entry)
    }
    /// Mean of `metric` across the rows.
    pub fn get(&self, metric: Metric) -> Option<f32> {
        self.metrics.get(&metric).map(|e| e.mean)
    }
    /// Number of rows that contributed to the mean of `metric`.
    pub fn support(&self, metric: Metric) -> Option<usize> {
        self.metrics.get(&metric).map(|e| e.support)
    }
    pub fn iter(&self) -> impl Iterator<Item = (Metric, AggregateEntry)> + '_ {
        self.metrics.iter().map(|(m, e)| (*m, *e))
    }
}

/// Each line holds a label and a fixed-point mean with 3 decimals.
impl Display for AggregateReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for metric in Metric::REPORT_ORDER {
            if let Some(mean) = self.get(metric) {
                writeln!(f, "{}: {:.3}", metric.label(), mean)?
            }
        }
        Ok(())
    }
}

/// Raw counts of every row, displayed like a dataframe. Built with `Scores::counts_table`.
pub struct CountsTable<'a> {
    pub(crate) rows: Vec<(usize, &'a RowCounts)>,
}

impl Display for CountsTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Row, Phrases in output, Phrases in gold, Matched phrases, Tokens in output, Tokens in gold, Matched tokens"
        )?;
        for (row, counts) in self.rows.iter() {
            writeln!(
                f,
                "{}, {}, {}, {}, {}, {}, {}",
                row,
                counts.phrases_in_output,
                counts.phrases_in_gold,
                counts.matched_phrases,
                counts.tokens_in_output,
                counts.tokens_in_gold,
                counts.matched_tokens
            )?
        }
        Ok(())
    }
}
