/**
This module loads the annotated dataset, gives access to its columns by header and writes it back
with the metric columns appended. Cells are kept as strings: the dataset only holds free text.
*/
use crate::metrics::Scores;
use crate::reporter::Metric;
use csv::{ReaderBuilder, WriterBuilder};
use enum_iterator::all;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const IN_MEMORY: &str = "<memory>";

/// Errors raised while reading, editing or writing a `Table`. Every variant names the file (or
/// `<memory>` for tables built from readers and writers) it comes from.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Could not access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed CSV in {origin}: {source}")]
    Csv { origin: String, source: csv::Error },
    #[error("Row {row} of {origin} has {found} cells but the header has {expected} columns")]
    RowTooLong {
        row: usize,
        expected: usize,
        found: usize,
        origin: String,
    },
    #[error("Column `{column}` does not exist in {origin}")]
    MissingColumn { column: String, origin: String },
    #[error("Column `{column}` has {found} cells but the table has {expected} rows")]
    RowCountMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
}

impl TableError {
    fn io(path: &str) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: String::from(path),
            source,
        }
    }
    fn csv(origin: &str) -> impl FnOnce(csv::Error) -> Self + '_ {
        move |source| Self::Csv {
            origin: String::from(origin),
            source,
        }
    }
}

/// In-memory tabular dataset. Every row has exactly one cell per header; missing cells are
/// read as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    origin: String,
}

impl Table {
    /// Builds a table from its headers and rows. Short rows are padded with empty cells; a row
    /// longer than the header is an error.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        Self::with_origin(headers, rows, String::from(IN_MEMORY))
    }

    fn with_origin(
        headers: Vec<String>,
        mut rows: Vec<Vec<String>>,
        origin: String,
    ) -> Result<Self, TableError> {
        let width = headers.len();
        for (index, row) in rows.iter_mut().enumerate() {
            if row.len() > width {
                return Err(TableError::RowTooLong {
                    row: index,
                    expected: width,
                    found: row.len(),
                    origin,
                });
            }
            row.resize(width, String::new());
        }
        Ok(Self {
            headers,
            rows,
            origin,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let origin = path.as_ref().display().to_string();
        let file = File::open(path.as_ref()).map_err(TableError::io(&origin))?;
        let table = Self::read_csv(file, origin)?;
        info!(
            path = %table.origin,
            rows = table.len(),
            columns = table.headers.len(),
            "Loaded dataset"
        );
        Ok(table)
    }

    /// Reads a CSV document with a header line. Rows may be shorter than the header, never
    /// longer.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        Self::read_csv(reader, String::from(IN_MEMORY))
    }

    fn read_csv<R: Read>(reader: R, origin: String) -> Result<Self, TableError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .map_err(TableError::csv(&origin))?
            .iter()
            .map(String::from)
            .collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(String::from).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()
            .map_err(TableError::csv(&origin))?;
        Self::with_origin(headers, rows, origin)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of rows, header excluded.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// The cells of `column`, in row order.
    pub fn column(&self, column: &str) -> Result<Vec<&str>, TableError> {
        let index = self
            .position(column)
            .ok_or_else(|| TableError::MissingColumn {
                column: String::from(column),
                origin: self.origin.clone(),
            })?;
        Ok(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Replaces the cells of `column`, or appends it if it does not exist yet.
    pub fn set_column(&mut self, column: &str, cells: Vec<String>) -> Result<(), TableError> {
        if cells.len() != self.len() {
            return Err(TableError::RowCountMismatch {
                column: String::from(column),
                expected: self.len(),
                found: cells.len(),
            });
        }
        match self.position(column) {
            Some(index) => {
                debug!(column, "Overwriting existing column");
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row[index] = cell;
                }
            }
            None => {
                self.headers.push(String::from(column));
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row.push(cell);
                }
            }
        }
        Ok(())
    }

    /// Appends the six metric columns of the scored `column`, named like `"PLP {column}"`.
    /// Undefined metrics are written as empty cells.
    pub fn append_scores(&mut self, column: &str, scores: &Scores) -> Result<(), TableError> {
        for metric in all::<Metric>() {
            let cells = scores
                .column(metric)
                .iter()
                .map(|v| if v.is_nan() { String::new() } else { v.to_string() })
                .collect();
            self.set_column(&metric.column_name(column), cells)?;
        }
        Ok(())
    }

    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let target = path.as_ref().display().to_string();
        let file = File::create(path.as_ref()).map_err(TableError::io(&target))?;
        self.write_csv(file, &target)?;
        info!(path = %target, rows = self.len(), "Saved dataset");
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), TableError> {
        self.write_csv(writer, IN_MEMORY)
    }

    fn write_csv<W: Write>(&self, writer: W, target: &str) -> Result<(), TableError> {
        let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);
        writer
            .write_record(&self.headers)
            .map_err(TableError::csv(target))?;
        for row in self.rows.iter() {
            writer.write_record(row).map_err(TableError::csv(target))?;
        }
        writer.flush().map_err(TableError::io(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScorerConfig;
    use crate::metrics::score;
    use std::io::Cursor;

    const DATASET: &str = "Id,Gold,SciSpacy
0,fever cough,fever cough
1,fever cough,fever
2,\"nausea, vomiting\"
";

    fn load() -> Table {
        Table::from_reader(Cursor::new(DATASET)).unwrap()
    }

    #[test]
    fn test_read_pads_short_rows() {
        let table = load();
        assert_eq!(table.len(), 3);
        assert_eq!(table.headers(), ["Id", "Gold", "SciSpacy"]);
        assert_eq!(
            table.column("SciSpacy").unwrap(),
            vec!["fever cough", "fever", ""]
        );
        assert_eq!(
            table.column("Gold").unwrap(),
            vec!["fever cough", "fever cough", "nausea, vomiting"]
        );
    }

    #[test]
    fn test_missing_column() {
        let table = load();
        match table.column("MetaMap") {
            Err(TableError::MissingColumn { column, origin }) => {
                assert_eq!(column, "MetaMap");
                assert_eq!(origin, "<memory>");
            }
            other => panic!("Expected a missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_row_longer_than_header() {
        let actual = Table::from_reader(Cursor::new("Gold,Out\nfever,fever\nfever,fever,cough\n"));
        match actual {
            Err(TableError::RowTooLong {
                row,
                expected,
                found,
                origin,
            }) => {
                assert_eq!((row, expected, found), (1, 2, 3));
                assert_eq!(origin, "<memory>");
            }
            other => panic!("Expected a row too long, got {:?}", other),
        }
    }

    #[test]
    fn test_new_keeps_every_cell() {
        let headers = vec![String::from("Gold"), String::from("Out")];
        let short = Table::new(headers.clone(), vec![vec![String::from("fever")]]).unwrap();
        assert_eq!(short.column("Out").unwrap(), vec![""]);
        let long = vec![vec![String::from("a"), String::from("b"), String::from("c")]];
        assert!(matches!(
            Table::new(headers, long),
            Err(TableError::RowTooLong { found: 3, .. })
        ));
    }

    #[test]
    fn test_set_column_overwrites() {
        let mut table = load();
        let cells = vec![String::from("a"), String::from("b"), String::from("c")];
        table.set_column("Gold", cells.clone()).unwrap();
        assert_eq!(table.headers().len(), 3);
        assert_eq!(table.column("Gold").unwrap(), vec!["a", "b", "c"]);
        table.set_column("Extra", cells).unwrap();
        assert_eq!(table.headers().len(), 4);
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut table = load();
        let actual = table.set_column("Extra", vec![String::from("a")]);
        assert!(matches!(
            actual,
            Err(TableError::RowCountMismatch {
                expected: 3,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_append_scores_and_write() {
        let mut table = load();
        let outputs = table.column("SciSpacy").unwrap();
        let golds = table.column("Gold").unwrap();
        let scores = score(&outputs, &golds, &ScorerConfig::default()).unwrap();
        table.append_scores("SciSpacy", &scores).unwrap();
        assert_eq!(table.headers().len(), 9);
        assert_eq!(table.headers()[3], "PLP SciSpacy");
        assert_eq!(table.headers()[8], "Token F1 SciSpacy");
        assert_eq!(table.column("TLR SciSpacy").unwrap(), vec!["1", "0.5", "0"]);

        let mut buffer = Vec::new();
        table.to_writer(&mut buffer).unwrap();
        let written = String::from_utf8(buffer).unwrap();
        let reloaded = Table::from_reader(Cursor::new(written)).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scored.csv");
        let table = load();
        table.to_path(&path).unwrap();
        let reloaded = Table::from_path(&path).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.column("Gold").unwrap(), table.column("Gold").unwrap());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        let actual = Table::from_path(&path);
        assert!(matches!(actual, Err(TableError::Io { .. })));
        let message = actual.unwrap_err().to_string();
        assert!(message.contains(&path.display().to_string()), "{}", message);
    }
}
