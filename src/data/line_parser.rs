use clap::ValueEnum;
use serde::{Serialize, Deserialize};

use crate::data::record::Record;
use crate::error::{MlpError, Result};

/// Where the expected outputs sit in a CSV line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// `input_size` input cells, then the outputs.
    #[default]
    InputFirst,
    /// `output_size` output cells, then the inputs.
    OutputFirst,
}

/// Turns one CSV line into a [`Record`], validating its shape.
///
/// In predict mode a line may hold only the inputs (input-only policy);
/// otherwise it must hold exactly `input_size + output_size` cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineParser {
    pub input_size: usize,
    pub output_size: usize,
    pub layout: ColumnLayout,
    pub predict: bool,
}

impl LineParser {
    pub fn new(input_size: usize, output_size: usize, layout: ColumnLayout) -> LineParser {
        LineParser { input_size, output_size, layout, predict: false }
    }

    pub fn predict_mode(mut self, predict: bool) -> LineParser {
        self.predict = predict;
        self
    }

    pub fn expected_columns(&self) -> usize {
        self.input_size + self.output_size
    }

    /// Parses `line`; `line_number` is only used in error messages.
    pub fn parse(&self, line: &str, line_number: usize) -> Result<Record> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        if line.trim().is_empty() {
            return Err(MlpError::CsvParsingErrorEmptyLine { line: line_number });
        }

        let cells = split_csv_row(line, line_number)?;

        if self.predict {
            if cells.len() < self.input_size {
                return Err(MlpError::CsvParsingErrorColumnsMin {
                    line: line_number,
                    found: cells.len(),
                    min: self.input_size,
                });
            }
            if cells.len() == self.input_size {
                let inputs = parse_cells(&cells, 0, line_number)?;
                return Ok(Record::inputs_only(inputs));
            }
        } else if cells.len() != self.expected_columns() {
            return Err(MlpError::CsvParsingErrorColumnsSize {
                line: line_number,
                found: cells.len(),
                expected: self.expected_columns(),
            });
        }

        match self.layout {
            ColumnLayout::InputFirst => {
                let (input_cells, output_cells) = cells.split_at(self.input_size);
                Ok(Record::new(
                    parse_cells(input_cells, 0, line_number)?,
                    parse_cells(output_cells, self.input_size, line_number)?,
                ))
            }
            ColumnLayout::OutputFirst => {
                let split = cells.len() - self.input_size;
                let (output_cells, input_cells) = cells.split_at(split);
                Ok(Record::new(
                    parse_cells(input_cells, split, line_number)?,
                    parse_cells(output_cells, 0, line_number)?,
                ))
            }
        }
    }
}

/// Splits one CSV row into cells, honouring double-quoted fields.
pub fn split_csv_row(line: &str, line_number: usize) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    let read = reader.read_record(&mut record).map_err(|_| MlpError::CsvParsingErrorColumnsBadFormat {
        line: line_number,
        column: 0,
        cell: line.to_owned(),
    })?;
    if !read {
        return Ok(vec![String::new()]);
    }
    Ok(record.iter().map(str::to_owned).collect())
}

/// Parses cells as finite `f32`; `first_column` is the 0-based column of `cells[0]`.
fn parse_cells(cells: &[String], first_column: usize, line_number: usize) -> Result<Vec<f32>> {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            cell.trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| MlpError::CsvParsingErrorColumnsBadFormat {
                    line: line_number,
                    column: first_column + i + 1,
                    cell: cell.clone(),
                })
        })
        .collect()
}
