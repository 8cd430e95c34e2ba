/*
 * This modules contains the `ScorerConfig` struct and its builder. The config holds every policy
 * the scorer needs: how to split phrases, how to match them, what to do with empty denominators,
 * whether to lowercase the cells and whether to use multiple cores. It implements the default
 * trait: whitespace phrases, membership matching and 0 for the undefined metrics.
*/
use crate::metrics::DivByZeroStrat;
use either::Either as LeftOrRight;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a string cannot be parsed into one of the configuration enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not parse `{value}` into a `{target}`")]
pub struct ParsingError {
    value: String,
    target: &'static str,
}

impl ParsingError {
    pub(crate) fn new(value: &str, target: &'static str) -> Self {
        Self {
            value: String::from(value),
            target,
        }
    }
}

/// Separator between two phrases of an annotation. Tokens inside a phrase are always separated
/// by whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Delimiter {
    /// Every whitespace-separated word is its own phrase.
    #[default]
    Whitespace,
    /// Phrases are separated by this character, e.g. `,` for `"chest pain, fever"`.
    Char(char),
}

impl Delimiter {
    /// Splits `text` into trimmed, non-empty phrases.
    pub(crate) fn split<'a>(&self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let pieces = match *self {
            Delimiter::Whitespace => LeftOrRight::Left(text.split_whitespace()),
            Delimiter::Char(c) => LeftOrRight::Right(text.split(c)),
        };
        pieces.map(str::trim).filter(|p| !p.is_empty())
    }
}

impl Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Whitespace => write!(f, "whitespace"),
            Self::Char(',') => write!(f, "comma"),
            Self::Char(';') => write!(f, "semicolon"),
            Self::Char(c) => write!(f, "{}", c),
        }
    }
}

impl FromStr for Delimiter {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "whitespace" | "space" | "ws" => Ok(Delimiter::Whitespace),
            "comma" => Ok(Delimiter::Char(',')),
            "semicolon" => Ok(Delimiter::Char(';')),
            "pipe" => Ok(Delimiter::Char('|')),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_whitespace() => Ok(Delimiter::Whitespace),
                    (Some(c), None) => Ok(Delimiter::Char(c)),
                    _ => Err(ParsingError::new(s, "Delimiter")),
                }
            }
        }
    }
}

/// How predicted phrases are matched against the gold phrases of the same row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PhraseMatching {
    /// A predicted phrase is correct if it appears anywhere in the gold phrases. Two identical
    /// predicted phrases can both match a single gold phrase.
    #[default]
    Membership,
    /// Every gold phrase can be matched at most once (multiset intersection).
    OneToOne,
}

impl Display for PhraseMatching {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Membership => write!(f, "membership"),
            Self::OneToOne => write!(f, "one-to-one"),
        }
    }
}

impl FromStr for PhraseMatching {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "membership" | "member" => Ok(PhraseMatching::Membership),
            "onetoone" | "one-to-one" | "one_to_one" | "multiset" => Ok(PhraseMatching::OneToOne),
            _ => Err(ParsingError::new(s, "PhraseMatching")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Config struct used to simplify the inputs of parameters to the `score` function. It implements
/// the default trait.
pub struct ScorerConfig {
    /// What to do when a row has nothing in the denominator of a metric, i.e. an empty output or
    /// an empty gold annotation. The most common solution is to replace the results by 0.
    zero_division: DivByZeroStrat,
    /// Separator between phrases. Whitespace by default, in which case every word is a phrase
    /// and the phrase and token levels split the text the same way.
    phrase_delimiter: Delimiter,
    /// Matching of predicted phrases against the gold phrases.
    matching: PhraseMatching,
    /// Are the comparisons case-insensitive? If so, both cells are lowercased before splitting.
    lowercase: bool,
    /// Can we use multiple cores to count and divide? As with most small workloads, the
    /// sequential path is usually faster.
    parallel: bool,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            zero_division: DivByZeroStrat::ReplaceBy0,
            phrase_delimiter: Delimiter::Whitespace,
            matching: PhraseMatching::Membership,
            lowercase: true,
            parallel: false,
        }
    }
}

impl ScorerConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn zero_division(&self) -> DivByZeroStrat {
        self.zero_division
    }
    pub fn phrase_delimiter(&self) -> Delimiter {
        self.phrase_delimiter
    }
    pub fn matching(&self) -> PhraseMatching {
        self.matching
    }
    pub fn lowercase(&self) -> bool {
        self.lowercase
    }
    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

impl Display for ScorerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = format!("Strategy when encountering a division by zero: {:?}\n Phrase delimiter: {}\n Phrase matching: {}\n Lowercasing the cells: {}\n Using parallel computations: {}", self.zero_division, self.phrase_delimiter, self.matching, self.lowercase, self.parallel);
        write!(f, "{}", string)
    }
}

impl From<ScorerConfigBuilder> for ScorerConfig {
    fn from(value: ScorerConfigBuilder) -> Self {
        Self {
            zero_division: value.zero_division,
            phrase_delimiter: value.phrase_delimiter,
            matching: value.matching,
            lowercase: value.lowercase,
            parallel: value.parallel,
        }
    }
}

/// This builder can be used to build and customize a `ScorerConfig` structure.
#[derive(Clone, Debug)]
pub struct ScorerConfigBuilder {
    zero_division: DivByZeroStrat,
    phrase_delimiter: Delimiter,
    matching: PhraseMatching,
    lowercase: bool,
    parallel: bool,
}

impl Default for ScorerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScorerConfigBuilder {
    pub fn division_by_zero<ZeroDiv: Into<DivByZeroStrat>>(
        mut self,
        division_by_zero: ZeroDiv,
    ) -> Self {
        self.zero_division = division_by_zero.into();
        self
    }
    pub fn phrase_delimiter(mut self, phrase_delimiter: Delimiter) -> Self {
        self.phrase_delimiter = phrase_delimiter;
        self
    }
    pub fn matching(mut self, matching: PhraseMatching) -> Self {
        self.matching = matching;
        self
    }
    pub fn lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn new() -> Self {
        let defaults = ScorerConfig::default();
        Self {
            zero_division: defaults.zero_division,
            phrase_delimiter: defaults.phrase_delimiter,
            matching: defaults.matching,
            lowercase: defaults.lowercase,
            parallel: defaults.parallel,
        }
    }
    pub fn build(self) -> ScorerConfig {
        ScorerConfig::from(self)
    }
}
