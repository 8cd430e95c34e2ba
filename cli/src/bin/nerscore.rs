use anyhow::{Context, Result};
use clap::Parser;
use nerscore::{
    add_gold_column, AbbreviationTable, Delimiter, DivByZeroStrat, Evaluator, GoldField,
    PhraseMatching, ScoreSet, ScorerConfig, ScorerConfigBuilder, Table,
};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Scores a column of NER outputs against a gold column and prints the averaged phrase level and
/// token level metrics.
#[derive(Debug, Parser)]
#[command(name = "nerscore", version)]
struct Args {
    /// Path to the CSV dataset
    #[arg(env = "NERSCORE_DATASET")]
    dataset: PathBuf,

    /// Column holding the system outputs
    #[arg(short, long, env = "NERSCORE_COLUMN")]
    column: String,

    /// Column holding the gold annotations
    #[arg(short, long, default_value = "Gold", env = "NERSCORE_GOLD")]
    gold: String,

    /// Where to write the dataset with the six metric columns appended
    #[arg(short, long, env = "NERSCORE_OUTPUT")]
    output: Option<PathBuf>,

    /// Strategy when a row has an empty output or gold cell: zero, one, error or exclude
    #[arg(long, default_value_t = DivByZeroStrat::ReplaceBy0, env = "NERSCORE_ZERO_DIVISION")]
    zero_division: DivByZeroStrat,

    /// Separator between phrases: whitespace, comma, semicolon or any single character
    #[arg(long, default_value_t = Delimiter::Whitespace, env = "NERSCORE_PHRASE_DELIMITER")]
    phrase_delimiter: Delimiter,

    /// Phrase matching: membership or one-to-one
    #[arg(long, default_value_t = PhraseMatching::Membership, env = "NERSCORE_MATCHING")]
    matching: PhraseMatching,

    /// Compare the cells without lowercasing them
    #[arg(long, env = "NERSCORE_CASE_SENSITIVE")]
    case_sensitive: bool,

    /// Count and divide on multiple cores
    #[arg(long, env = "NERSCORE_PARALLEL")]
    parallel: bool,

    /// Build the gold column from the raw ground truth before scoring, keeping the names or the
    /// measures of every entry
    #[arg(long, env = "NERSCORE_PREPARE_GOLD")]
    prepare_gold: Option<GoldField>,

    /// Raw ground truth column used by --prepare-gold. Defaults to "NER Ground Truth Names" or
    /// "NER Ground Truth Measures"
    #[arg(long, requires = "prepare_gold", env = "NERSCORE_GOLD_SOURCE")]
    gold_source: Option<String>,

    /// Print the raw counts and the scores of every row
    #[arg(long)]
    debug_counts: bool,

    /// Increase the log verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> ScorerConfig {
        ScorerConfigBuilder::new()
            .division_by_zero(self.zero_division)
            .phrase_delimiter(self.phrase_delimiter)
            .matching(self.matching)
            .lowercase(!self.case_sensitive)
            .parallel(self.parallel)
            .build()
    }
}

fn default_gold_source(field: GoldField) -> &'static str {
    match field {
        GoldField::Names => "NER Ground Truth Names",
        GoldField::Measures => "NER Ground Truth Measures",
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = args.config();
    debug!("Scorer configuration:\n {}", config);

    let mut table = Table::from_path(&args.dataset).context("Failed to load dataset")?;

    if let Some(field) = args.prepare_gold {
        let source = args
            .gold_source
            .as_deref()
            .unwrap_or_else(|| default_gold_source(field));
        add_gold_column(
            &mut table,
            source,
            &args.gold,
            field,
            &AbbreviationTable::default(),
        )
        .with_context(|| format!("Failed to prepare gold column `{}` from `{}`", args.gold, source))?;
    }

    let evaluator = Evaluator::from_table(&args.column, &args.gold, table, config)
        .with_context(|| format!("Failed to score column `{}` against `{}`", args.column, args.gold))?;

    if args.debug_counts {
        print!("{}", evaluator.counts_table());
        println!("{}", ScoreSet::HEADER);
        for set in evaluator.scores().iter() {
            println!("{}", set);
        }
    }
    print!("{}", evaluator.report());

    if let Some(output) = &args.output {
        evaluator
            .export(output)
            .with_context(|| format!("Failed to export scores to {}", output.display()))?;
        info!(path = %output.display(), "Exported scores");
    }
    Ok(())
}
