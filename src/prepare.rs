//! Preparation of the gold annotations. The hand-labeled ground truth holds one entry per
//! concept, separated by `;`, and every entry is a comma-separated record such as
//! `"blood pressure, 120/80"`. Before scoring, a single field is kept from every entry and the
//! clinical abbreviations are expanded.
use crate::config::ParsingError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

const ENTRY_SEPARATOR: char = ';';
const FIELD_SEPARATOR: char = ',';
const JOINER: &str = ", ";

/// Which field of every ground-truth entry is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GoldField {
    /// The first field, holding the name of the concept.
    #[default]
    Names,
    /// The last field, holding the measure of the concept.
    Measures,
}

impl GoldField {
    /// Keeps the selected field of every `;`-separated entry of `cell` and joins them with
    /// `", "`. Empty entries are skipped.
    pub fn extract(&self, cell: &str) -> String {
        let fields: Vec<&str> = cell
            .split(ENTRY_SEPARATOR)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| {
                let mut fields = entry.split(FIELD_SEPARATOR);
                match self {
                    Self::Names => fields.next(),
                    Self::Measures => fields.next_back(),
                }
            })
            .map(str::trim)
            .collect();
        fields.join(JOINER)
    }
}

impl Display for GoldField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Names => write!(f, "names"),
            Self::Measures => write!(f, "measures"),
        }
    }
}

impl FromStr for GoldField {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "names" | "name" | "first" => Ok(GoldField::Names),
            "measures" | "measure" | "last" => Ok(GoldField::Measures),
            _ => Err(ParsingError::new(s, "GoldField")),
        }
    }
}

/// Ordered list of abbreviations and their expansion. Matching is done on whole words and
/// ignores the case of the word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbbreviationTable {
    entries: Vec<(String, String)>,
}

impl Default for AbbreviationTable {
    fn default() -> Self {
        Self::new([
            ("spo2", "supplemental oxygen"),
            ("resp", "respiratory rate"),
            ("bp", "blood pressure"),
            ("gcs", "glasgow coma score"),
            ("ekg", "electrocardiogram"),
        ])
    }
}

impl AbbreviationTable {
    pub fn new<I, A, F>(entries: I) -> Self
    where
        I: IntoIterator<Item = (A, F)>,
        A: Into<String>,
        F: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(a, f)| {
                    let abbreviation: String = a.into();
                    (abbreviation.to_lowercase(), f.into())
                })
                .collect(),
        }
    }

    /// An empty table, leaving the text untouched.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, word: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(abbreviation, _)| abbreviation.eq_ignore_ascii_case(word))
            .map(|(_, full_form)| full_form.as_str())
    }

    /// Replaces every abbreviation of `text` by its full form. Words are maximal runs of
    /// alphanumeric characters; everything else is copied as is.
    pub fn expand(&self, text: &str) -> String {
        if self.is_empty() {
            return String::from(text);
        }
        let mut expanded = String::with_capacity(text.len());
        let mut word_start = None;
        for (index, c) in text.char_indices() {
            match (c.is_alphanumeric(), word_start) {
                (true, None) => word_start = Some(index),
                (false, Some(start)) => {
                    self.push_word(&mut expanded, &text[start..index]);
                    word_start = None;
                    expanded.push(c);
                }
                (false, None) => expanded.push(c),
                (true, Some(_)) => {}
            }
        }
        if let Some(start) = word_start {
            self.push_word(&mut expanded, &text[start..]);
        }
        expanded
    }

    fn push_word(&self, buffer: &mut String, word: &str) {
        buffer.push_str(self.lookup(word).unwrap_or(word))
    }
}

/// Prepares a whole ground-truth column: keeps `field` of every entry and expands the
/// abbreviations of `table`.
pub fn prepare_gold<S: AsRef<str>>(
    cells: &[S],
    field: GoldField,
    table: &AbbreviationTable,
) -> Vec<String> {
    cells
        .iter()
        .map(|cell| table.expand(&field.extract(cell.as_ref())))
        .collect()
}
