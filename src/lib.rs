/*!
This library evaluates the output of named entity recognition systems against hand-labeled
annotations. Every row of a dataset holds the text extracted by a system and the gold text of the
same document. The library computes, for every row, the precision, recall and f-score at two
granularities and averages them across the dataset.

# Terminology
* A cell is the free text held by a column for a given row, such as `"chest pain fever"`.
* A phrase is a unit of the cell, delimited by whitespace by default. With a custom delimiter such
    as `,`, the cell `"chest pain, fever"` holds the phrases `"chest pain"` and `"fever"`.
* A token is a whitespace-separated word of a phrase.
* The phrase level compares whole phrases, while the token level compares the sets of tokens of
    the two cells.

# Zero division
A row with an empty output (or an empty gold cell) has nothing to divide its matches by. The
`DivByZeroStrat` decides what happens: the metric can be replaced by 0 or 1, the computation can
fail, or the row can be left out of the mean of that metric.

# Dataset
The `Table` reads and writes CSV files. The `Evaluator` scores a column of a `Table` and exports
the six metric columns (`PLP`, `PLR`, `Phrase F1`, `TLP`, `TLR`, `Token F1`) next to the data. The
raw ground truth, a list of `;`-separated `name, measure` entries, can be turned into a gold column
with `add_gold_column`.
*/

mod config;
mod datastructure;
mod evaluator;
mod metrics;
mod prepare;
mod reporter;
mod table;

// The public api starts here
pub use config::{Delimiter, ParsingError, PhraseMatching, ScorerConfig, ScorerConfigBuilder};

pub use metrics::{
    score, ComputationError, DivByZeroStrat, InconsistentLengthError, RowCounts, Scores,
};

pub use reporter::{AggregateEntry, AggregateReport, CountsTable, Level, Metric, ScoreSet};

pub use prepare::{prepare_gold, AbbreviationTable, GoldField};

pub use table::{Table, TableError};

pub use evaluator::{add_gold_column, EvaluationError, Evaluator};

/// Scores the rows and averages every metric across them. This is a shortcut for
/// `score(outputs, golds, config)?.aggregate()`.
///
/// * `outputs`: System outputs, one annotation per row
/// * `golds`: Gold annotations, aligned with `outputs`
/// * `config`: Splitting, matching and division by zero policies
///
/// #Example
/// ```rust
/// use nerscore::{evaluate, DivByZeroStrat, Metric, ScorerConfigBuilder};
///
/// let outputs = vec!["fever cough", "", "headache"];
/// let golds = vec!["fever cough", "fever", "headache nausea"];
/// let config = ScorerConfigBuilder::new()
///     .division_by_zero(DivByZeroStrat::Exclude)
///     .build();
///
/// let report = evaluate(&outputs, &golds, &config).unwrap();
/// assert_eq!(report.get(Metric::TokenPrecision), Some(1.0));
/// assert_eq!(report.support(Metric::TokenPrecision), Some(2));
/// assert_eq!(report.get(Metric::TokenRecall), Some(0.5));
/// ```
pub fn evaluate<O, G>(
    outputs: &[O],
    golds: &[G],
    config: &ScorerConfig,
) -> Result<AggregateReport, ComputationError>
where
    O: AsRef<str> + Sync,
    G: AsRef<str> + Sync,
{
    Ok(score(outputs, golds, config)?.aggregate())
}
