use crate::config::ScorerConfig;
use crate::metrics::{score, ComputationError, Scores};
use crate::prepare::{prepare_gold, AbbreviationTable, GoldField};
use crate::reporter::{AggregateReport, CountsTable};
use crate::table::{Table, TableError};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Computation(#[from] ComputationError),
}

/// Scores one system-output column of a dataset against its gold column. The scores are
/// computed once, when the evaluator is built.
///
/// # Example
///
/// ```rust
/// use nerscore::{Evaluator, Metric, ScorerConfig, Table};
///
/// let csv = "Gold,SciSpacy\nfever cough,fever cough\nfever cough,fever\nnausea,headache\n";
/// let table = Table::from_reader(csv.as_bytes()).unwrap();
/// let evaluator = Evaluator::from_table("SciSpacy", "Gold", table, ScorerConfig::default()).unwrap();
///
/// assert_eq!(evaluator.scores().len(), 3);
/// let report = evaluator.report();
/// assert_eq!(format!("{:.3}", report.get(Metric::TokenFScore).unwrap()), "0.556");
/// ```
#[derive(Debug, Clone)]
pub struct Evaluator {
    column: String,
    gold_column: String,
    table: Table,
    scores: Scores,
    config: ScorerConfig,
}

impl Evaluator {
    /// Loads the dataset at `path` and scores `column` against `gold_column`.
    pub fn from_path<P: AsRef<Path>>(
        column: &str,
        gold_column: &str,
        path: P,
        config: ScorerConfig,
    ) -> Result<Self, EvaluationError> {
        let table = Table::from_path(path)?;
        Self::from_table(column, gold_column, table, config)
    }

    pub fn from_table(
        column: &str,
        gold_column: &str,
        table: Table,
        config: ScorerConfig,
    ) -> Result<Self, EvaluationError> {
        let outputs = table.column(column)?;
        let golds = table.column(gold_column)?;
        info!(column, gold_column, rows = outputs.len(), "Scoring column");
        let scores = score(&outputs, &golds, &config)?;
        Ok(Self {
            column: String::from(column),
            gold_column: String::from(gold_column),
            table,
            scores,
            config,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn gold_column(&self) -> &str {
        &self.gold_column
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    pub fn scores(&self) -> &Scores {
        &self.scores
    }

    /// Mean of every metric across the rows.
    pub fn report(&self) -> AggregateReport {
        self.scores.aggregate()
    }

    pub fn counts_table(&self) -> CountsTable<'_> {
        self.scores.counts_table()
    }

    /// A copy of the dataset with the six metric columns of the scored column appended.
    pub fn table_with_scores(&self) -> Result<Table, TableError> {
        let mut table = self.table.clone();
        table.append_scores(&self.column, &self.scores)?;
        Ok(table)
    }

    /// Writes the dataset with the metric columns to `path`.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        self.table_with_scores()?.to_path(path)
    }
}

/// Builds the `target` gold column of `table` from the raw ground truth held in `source`.
pub fn add_gold_column(
    table: &mut Table,
    source: &str,
    target: &str,
    field: GoldField,
    abbreviations: &AbbreviationTable,
) -> Result<(), TableError> {
    let cells = prepare_gold(&table.column(source)?, field, abbreviations);
    info!(source, target, %field, "Prepared gold column");
    table.set_column(target, cells)
}
