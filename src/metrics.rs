/**
This module computes the metrics (precision, recall, f-score) of every row of a system output
against the gold annotation of the same row, at the phrase level and at the token level.
*/
use crate::config::{ParsingError, PhraseMatching, ScorerConfig};
use crate::datastructure::Segments;
use crate::reporter::{AggregateEntry, AggregateReport, CountsTable, Level, Metric, ScoreSet};
use ahash::{AHashMap, AHashSet};
use enum_iterator::all;
use itertools::multizip;
use ndarray::{prelude::*, Zip};
use num::Num;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// What to do when the denominator of a metric is 0, i.e. when a row has an empty output (for
/// the precision) or an empty gold annotation (for the recall).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DivByZeroStrat {
    /// The metric is 0
    #[default]
    ReplaceBy0,
    /// The metric is 1
    ReplaceBy1,
    /// Returns an error
    ReturnError,
    /// The metric is `NaN` and the row is left out of the mean of this metric
    Exclude,
}

impl Display for DivByZeroStrat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for DivByZeroStrat {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "replaceby0" | "replacebyzero" | "zero" | "0" => Ok(DivByZeroStrat::ReplaceBy0),
            "replaceby1" | "replacebyone" | "one" | "1" => Ok(DivByZeroStrat::ReplaceBy1),
            "returnerror" | "error" => Ok(DivByZeroStrat::ReturnError),
            "exclude" | "skip" | "nan" => Ok(DivByZeroStrat::Exclude),
            _ => Err(ParsingError::new(s, "DivByZeroStrat")),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
/// Error type to represent when the outputs and the gold annotations are not of the same length.
#[error("Inconsistent length between two lists. `outputs` is length {0}, `golds` is length {1}")]
pub struct InconsistentLengthError(usize, usize);

#[derive(Debug, Clone, PartialEq, Error)]
/// Enum error encompassing the failures that could happen when scoring the rows.
pub enum ComputationError {
    #[error(transparent)]
    InconsistentLength(#[from] InconsistentLengthError),
    #[error("Received an empty input {0}")]
    EmptyInput(String),
    /// Only returned with `DivByZeroStrat::ReturnError`.
    #[error("Row {row} has nothing to divide by while computing the {metric}")]
    EmptyRow { row: usize, metric: Metric },
}

fn check_for_empty_slices<O, G>(outputs: &[O], golds: &[G]) -> Result<(), ComputationError> {
    if outputs.is_empty() {
        return Err(ComputationError::EmptyInput(String::from("outputs")));
    };
    if golds.is_empty() {
        return Err(ComputationError::EmptyInput(String::from("golds")));
    };
    Ok(())
}

fn check_consistent_length<O, G>(outputs: &[O], golds: &[G]) -> Result<(), InconsistentLengthError> {
    if outputs.len() != golds.len() {
        return Err(InconsistentLengthError(outputs.len(), golds.len()));
    }
    Ok(())
}

/// Raw counts of a single row. Every metric of the row is derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RowCounts {
    pub phrases_in_output: usize,
    pub phrases_in_gold: usize,
    pub matched_phrases: usize,
    pub tokens_in_output: usize,
    pub tokens_in_gold: usize,
    pub matched_tokens: usize,
}

impl RowCounts {
    /// Counts the phrases and tokens of a single output/gold pair.
    pub fn from_pair(output: &str, gold: &str, config: &ScorerConfig) -> Self {
        let output = normalize(output, config.lowercase());
        let gold = normalize(gold, config.lowercase());
        let output_segments = Segments::parse(&output, config.phrase_delimiter());
        let gold_segments = Segments::parse(&gold, config.phrase_delimiter());

        let output_tokens: AHashSet<&str> = output_segments.iter().copied().collect();
        let gold_tokens: AHashSet<&str> = gold_segments.iter().copied().collect();
        let matched_tokens = output_tokens.intersection(&gold_tokens).count();

        let matched_phrases = match config.matching() {
            PhraseMatching::Membership => {
                let gold_phrases: AHashSet<&[&str]> = gold_segments.iter_vec().collect();
                output_segments
                    .iter_vec()
                    .filter(|p| gold_phrases.contains(p))
                    .count()
            }
            PhraseMatching::OneToOne => {
                let mut remaining: AHashMap<&[&str], usize> = AHashMap::new();
                for phrase in gold_segments.iter_vec() {
                    *remaining.entry(phrase).or_insert(0) += 1;
                }
                output_segments
                    .iter_vec()
                    .filter(|p| match remaining.get_mut(p) {
                        Some(n) if *n > 0 => {
                            *n -= 1;
                            true
                        }
                        _ => false,
                    })
                    .count()
            }
        };

        Self {
            phrases_in_output: output_segments.phrase_count(),
            phrases_in_gold: gold_segments.phrase_count(),
            matched_phrases,
            tokens_in_output: output_segments.len(),
            tokens_in_gold: gold_segments.len(),
            matched_tokens,
        }
    }

    /// predicted sum, true positive sum and true sum of a level
    fn at_level(&self, level: Level) -> (usize, usize, usize) {
        match level {
            Level::Phrase => (
                self.phrases_in_output,
                self.matched_phrases,
                self.phrases_in_gold,
            ),
            Level::Token => (
                self.tokens_in_output,
                self.matched_tokens,
                self.tokens_in_gold,
            ),
        }
    }
}

fn normalize(cell: &str, lowercase: bool) -> Cow<'_, str> {
    if lowercase {
        Cow::Owned(cell.to_lowercase())
    } else {
        Cow::Borrowed(cell)
    }
}

fn extract_row_counts<O, G>(outputs: &[O], golds: &[G], config: &ScorerConfig) -> Array1<RowCounts>
where
    O: AsRef<str> + Sync,
    G: AsRef<str> + Sync,
{
    let zip = Zip::from(ArrayView1::from(outputs)).and(ArrayView1::from(golds));
    let count = |o: &O, g: &G| RowCounts::from_pair(o.as_ref(), g.as_ref(), config);
    if config.parallel() {
        zip.par_map_collect(count)
    } else {
        zip.map_collect(count)
    }
}

/// predicted sum, true positive sum and true sum
type ActualTPCorrect<T> = (Array1<T>, Array1<T>, Array1<T>);

fn extract_tp_actual_correct(counts: &Array1<RowCounts>, level: Level) -> ActualTPCorrect<f32> {
    let pred_sum = counts.mapv(|c| c.at_level(level).0 as f32);
    let tp_sum = counts.mapv(|c| c.at_level(level).1 as f32);
    let true_sum = counts.mapv(|c| c.at_level(level).2 as f32);
    (pred_sum, tp_sum, true_sum)
}

/// Divides `numerator` by `denominator` and applies `zero_division` wherever the denominator is
/// 0. A warning is emitted when at least one zero is found.
fn prf_divide(
    numerator: ArrayView1<f32>,
    denominator: Array1<f32>,
    parallel: bool,
    metric: Metric,
    zero_division: DivByZeroStrat,
) -> Result<Array1<f32>, ComputationError> {
    let (mut result, zero_mask) = if parallel {
        par_prf_divide_results_and_mask(numerator, denominator)
    } else {
        prf_divide_results_and_mask(numerator, denominator)
    };
    let zero_rows: Vec<usize> = zero_mask
        .iter()
        .enumerate()
        .filter_map(|(row, is_zero)| is_zero.then_some(row))
        .collect();
    let Some(first_row) = zero_rows.first().copied() else {
        return Ok(result);
    };
    warn!(
        %metric,
        level = %metric.level(),
        rows = zero_rows.len(),
        first_row,
        strategy = %zero_division,
        "Encountered a division by zero"
    );
    let fill = match zero_division {
        DivByZeroStrat::ReturnError => {
            return Err(ComputationError::EmptyRow {
                row: first_row,
                metric,
            })
        }
        DivByZeroStrat::ReplaceBy0 => 0.0,
        DivByZeroStrat::ReplaceBy1 => 1.0,
        DivByZeroStrat::Exclude => f32::NAN,
    };
    replace_masked(&mut result, &zero_mask, fill);
    Ok(result)
}

/// This function computes the result in parallel. For a synchronous
/// version of this function, see `prf_divide_results_and_mask`. The second
/// returned array is `true` where the denominator was zero.
///
/// * `numerator`: Numerator of the division
/// * `denominator`: Denominator of the division
fn par_prf_divide_results_and_mask<I: Num + Copy + Send + Sync>(
    numerator: ArrayView1<I>,
    mut denominator: Array1<I>,
) -> (Array1<I>, Array1<bool>) {
    let zero_mask = Zip::from(&denominator).par_map_collect(|d| *d == I::zero());
    denominator.par_mapv_inplace(|v| if v == I::zero() { I::one() } else { v });
    let result = Zip::from(numerator)
        .and(&denominator)
        .par_map_collect(|n, d| *n / *d);
    (result, zero_mask)
}

/// This function computes the result synchronously. For a parallel
/// version of this function, see `par_prf_divide_results_and_mask`.
///
/// * `numerator`: Numerator of the division
/// * `denominator`: Denominator of the division
fn prf_divide_results_and_mask<I: Num + Copy>(
    numerator: ArrayView1<I>,
    mut denominator: Array1<I>,
) -> (Array1<I>, Array1<bool>) {
    let zero_mask = denominator.mapv(|d| d == I::zero());
    denominator.mapv_inplace(|v| if v == I::zero() { I::one() } else { v });
    (&numerator / &denominator, zero_mask)
}

/// Helper function to replace the values of `array` where `mask` is `true`.
fn replace_masked<Data: Copy>(array: &mut Array1<Data>, mask: &Array1<bool>, new_value: Data) {
    Zip::from(array).and(mask).for_each(|v, &masked| {
        if masked {
            *v = new_value
        }
    });
}

/// Harmonic mean of the precision and recall. 0 when both are 0, `NaN` if either is `NaN`.
fn harmonic_mean(precision: &f32, recall: &f32) -> f32 {
    let denom = precision + recall;
    if denom == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / denom
    }
}

fn f_score(precision: &Array1<f32>, recall: &Array1<f32>, parallel: bool) -> Array1<f32> {
    let zip = Zip::from(precision).and(recall);
    if parallel {
        zip.par_map_collect(harmonic_mean)
    } else {
        zip.map_collect(harmonic_mean)
    }
}

/// Precision, recall and f-score of every row at a single level.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct LevelScores {
    precision: Array1<f32>,
    recall: Array1<f32>,
    fscore: Array1<f32>,
}

impl LevelScores {
    fn compute(
        counts: &Array1<RowCounts>,
        level: Level,
        config: &ScorerConfig,
    ) -> Result<Self, ComputationError> {
        let (precision_metric, recall_metric) = match level {
            Level::Phrase => (Metric::PhrasePrecision, Metric::PhraseRecall),
            Level::Token => (Metric::TokenPrecision, Metric::TokenRecall),
        };
        let (pred_sum, tp_sum, true_sum) = extract_tp_actual_correct(counts, level);
        let precision = prf_divide(
            tp_sum.view(),
            pred_sum,
            config.parallel(),
            precision_metric,
            config.zero_division(),
        )?;
        let recall = prf_divide(
            tp_sum.view(),
            true_sum,
            config.parallel(),
            recall_metric,
            config.zero_division(),
        )?;
        let fscore = f_score(&precision, &recall, config.parallel());
        Ok(Self {
            precision,
            recall,
            fscore,
        })
    }
}

/// Counts and metrics of every scored row, stored column by column. Built with `score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scores {
    counts: Array1<RowCounts>,
    phrase: LevelScores,
    token: LevelScores,
}

impl Scores {
    /// Number of scored rows.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The value of `metric` for every row.
    pub fn column(&self, metric: Metric) -> ArrayView1<f32> {
        match metric {
            Metric::PhrasePrecision => self.phrase.precision.view(),
            Metric::PhraseRecall => self.phrase.recall.view(),
            Metric::PhraseFScore => self.phrase.fscore.view(),
            Metric::TokenPrecision => self.token.precision.view(),
            Metric::TokenRecall => self.token.recall.view(),
            Metric::TokenFScore => self.token.fscore.view(),
        }
    }

    pub fn counts(&self) -> ArrayView1<RowCounts> {
        self.counts.view()
    }

    pub fn get(&self, row: usize) -> Option<ScoreSet> {
        let counts = *self.counts.get(row)?;
        Some(ScoreSet {
            row,
            counts,
            phrase_precision: self.phrase.precision[row],
            phrase_recall: self.phrase.recall[row],
            phrase_fscore: self.phrase.fscore[row],
            token_precision: self.token.precision[row],
            token_recall: self.token.recall[row],
            token_fscore: self.token.fscore[row],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = ScoreSet> + '_ {
        multizip((
            self.counts.iter(),
            self.phrase.precision.iter(),
            self.phrase.recall.iter(),
            self.phrase.fscore.iter(),
            self.token.precision.iter(),
            self.token.recall.iter(),
            self.token.fscore.iter(),
        ))
        .enumerate()
        .map(|(row, (counts, pp, pr, pf, tp, tr, tf))| ScoreSet {
            row,
            counts: *counts,
            phrase_precision: *pp,
            phrase_recall: *pr,
            phrase_fscore: *pf,
            token_precision: *tp,
            token_recall: *tr,
            token_fscore: *tf,
        })
    }

    /// Arithmetic mean of every metric across the rows. Undefined (`NaN`) values are left out of
    /// the mean; a metric undefined for every row is reported as 0.
    pub fn aggregate(&self) -> AggregateReport {
        let mut report = AggregateReport::default();
        for metric in all::<Metric>() {
            let defined: Array1<f32> = self
                .column(metric)
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .collect();
            let support = defined.len();
            let mean = defined.mean().unwrap_or_else(|| {
                warn!(%metric, "Every row was excluded, reporting 0");
                0.0
            });
            report.insert(metric, AggregateEntry { mean, support });
        }
        report
    }

    /// The raw counts of every row, displayable as a table.
    pub fn counts_table(&self) -> CountsTable<'_> {
        CountsTable {
            rows: self.counts.iter().enumerate().collect(),
        }
    }
}

/// Main entrypoint of the scorer. Compares every output with the gold annotation of the same
/// row and computes the phrase level and token level precision, recall and f-score of each row.
///
/// * `outputs`: System outputs, one annotation per row
/// * `golds`: Gold annotations, aligned with `outputs`
/// * `config`: Splitting, matching and division by zero policies
pub fn score<O, G>(outputs: &[O], golds: &[G], config: &ScorerConfig) -> Result<Scores, ComputationError>
where
    O: AsRef<str> + Sync,
    G: AsRef<str> + Sync,
{
    check_consistent_length(outputs, golds)?;
    check_for_empty_slices(outputs, golds)?;
    let counts = extract_row_counts(outputs, golds, config);
    for (row, c) in counts.iter().enumerate() {
        debug!(row, counts = ?c, "Counted row");
    }
    let phrase = LevelScores::compute(&counts, Level::Phrase, config)?;
    let token = LevelScores::compute(&counts, Level::Token, config)?;
    Ok(Scores {
        counts,
        phrase,
        token,
    })
}
