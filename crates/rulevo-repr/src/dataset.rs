//! Numeric dataset loading into an [`InstanceTable`].
//!
//! Accepts comma- or whitespace-separated numeric rows; blank lines and
//! `#`/`@` comment lines are skipped, as is a single non-numeric header
//! row. The trailing `labels` columns of every row are the label block.

use std::{fs, io, path::Path};

use rulevo_engine::InstanceTable;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DatasetError {
    #[display("failed to read dataset: {_0}")]
    Io(io::Error),
    #[display("line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[display("line {line}: invalid numeric field {token:?}")]
    InvalidNumber { line: usize, token: String },
    #[display("dataset rows have {columns} columns, fewer than {labels} labels plus one attribute")]
    TooFewColumns { columns: usize, labels: usize },
    #[display("dataset contains no instances")]
    Empty,
}

/// Loads `path` into a table whose last `labels` columns are labels.
pub fn load_table(path: &Path, labels: usize) -> Result<InstanceTable, DatasetError> {
    let text = fs::read_to_string(path).map_err(DatasetError::Io)?;
    parse_table(&text, labels)
}

/// Parses dataset text; see [`load_table`].
pub fn parse_table(text: &str, labels: usize) -> Result<InstanceTable, DatasetError> {
    let mut values: Vec<f64> = Vec::new();
    let mut columns: Option<usize> = None;
    let mut saw_data = false;

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('@') {
            continue;
        }
        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();

        let mut row: Vec<f64> = Vec::with_capacity(fields.len());
        let mut bad_token: Option<String> = None;
        for field in &fields {
            match field.parse::<f64>() {
                Ok(v) => row.push(v),
                Err(_) => {
                    bad_token = Some((*field).to_owned());
                    break;
                }
            }
        }
        if let Some(token) = bad_token {
            // One non-numeric leading row is a header.
            if !saw_data && columns.is_none() {
                continue;
            }
            return Err(DatasetError::InvalidNumber {
                line: line_no + 1,
                token,
            });
        }

        match columns {
            None => columns = Some(row.len()),
            Some(expected) if expected != row.len() => {
                return Err(DatasetError::RaggedRow {
                    line: line_no + 1,
                    expected,
                    found: row.len(),
                });
            }
            Some(_) => {}
        }
        values.extend(row);
        saw_data = true;
    }

    let Some(columns) = columns else {
        return Err(DatasetError::Empty);
    };
    if columns <= labels {
        return Err(DatasetError::TooFewColumns { columns, labels });
    }
    Ok(InstanceTable::new(values, columns - labels, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_csv_with_header_and_comments() {
        let text = "a,b,label\n# comment\n1,0,1\n0, 1, 0\n\n1,1,1\n";
        let table = parse_table(text, 1).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.attributes(), 2);
        assert_eq!(table.labels(), 1);
        assert_eq!(table.row(1), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn parses_whitespace_separated_rows() {
        let table = parse_table("1 0 1\n0 1 0\n", 1).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.attributes_of(0), &[1.0, 0.0]);
    }

    #[test]
    fn ragged_row_is_a_typed_error() {
        let err = parse_table("1,0,1\n1,0\n", 1).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::RaggedRow {
                line: 2,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn non_numeric_field_past_the_header_is_an_error() {
        let err = parse_table("1,0,1\n1,x,0\n", 1).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidNumber { line: 2, .. }));
    }

    #[test]
    fn label_count_must_leave_attributes() {
        let err = parse_table("1,0\n", 2).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::TooFewColumns {
                columns: 2,
                labels: 2
            }
        ));
        assert!(matches!(parse_table("", 1).unwrap_err(), DatasetError::Empty));
    }
}
