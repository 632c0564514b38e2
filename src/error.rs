//! Error types for the MLP engine.

use std::path::PathBuf;
use thiserror::Error;

/// Broad category of an [`MlpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid ratio, missing or invalid file, invalid directory, bad parameter.
    Configuration,
    /// CSV column count/format/empty line, JSON parse, invalid version.
    Parse,
    /// Wrong first/last layer type, unknown layer or activation type.
    Structural,
    /// File open/read/write failure.
    Io,
}

/// Every failure the engine reports to its caller.
#[derive(Error, Debug)]
pub enum MlpError {
    #[error("CSV parsing error at line {line}: empty line")]
    CsvParsingErrorEmptyLine { line: usize },

    #[error("CSV parsing error at line {line}: found {found} columns instead of {expected}")]
    CsvParsingErrorColumnsSize {
        line: usize,
        found: usize,
        expected: usize,
    },

    #[error("CSV parsing error at line {line}: found {found} columns, at least {min} are required")]
    CsvParsingErrorColumnsMin { line: usize, found: usize, min: usize },

    #[error("CSV parsing error at line {line}, column {column}: '{cell}' is not a valid number")]
    CsvParsingErrorColumnsBadFormat {
        line: usize,
        column: usize,
        cell: String,
    },

    #[error("Invalid training ratio {0}: must be in (0, 1]")]
    InvalidTrainingRatio(f32),

    #[error("Invalid training ratio: no line left for training")]
    InvalidTrainingRatioTooSmall,

    #[error("Invalid training ratio: training ratio line {ratio_line} leaves no line to test out of {total_lines}")]
    InvalidTrainingRatioTooBig { ratio_line: usize, total_lines: usize },

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Unable to open file {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid directory: {}", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("File parser is not open")]
    FileParserNotOpen,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Weights CSV error: {0}")]
    WeightsCsv(#[from] csv::Error),

    #[error("Invalid model version '{0}'")]
    InvalidJsonVersion(String),

    #[error("Invalid first layer type '{0}': expected InputLayer")]
    InvalidFirstLayerType(String),

    #[error("Invalid last layer type '{0}': expected OutputLayer")]
    InvalidLastLayerType(String),

    #[error("Invalid layer type '{found}' at index {index}: expected HiddenLayer")]
    InvalidHiddenLayerType { index: usize, found: String },

    #[error("Unimplemented layer type '{0}'")]
    UnimplementedLayerType(String),

    #[error("Unimplemented activation function '{0}'")]
    UnimplementedActivationFunction(String),

    #[error("Invalid model topology: {0}")]
    InvalidModelTopology(String),

    #[error("Invalid weights for layer {layer}, neuron {neuron}: {reason}")]
    InvalidModelWeights {
        layer: usize,
        neuron: usize,
        reason: String,
    },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl MlpError {
    pub fn kind(&self) -> ErrorKind {
        use MlpError::*;
        match self {
            InvalidTrainingRatio(_)
            | InvalidTrainingRatioTooSmall
            | InvalidTrainingRatioTooBig { .. }
            | FileNotFound(_)
            | InvalidDirectory(_)
            | InvalidParameter { .. } => ErrorKind::Configuration,

            CsvParsingErrorEmptyLine { .. }
            | CsvParsingErrorColumnsSize { .. }
            | CsvParsingErrorColumnsMin { .. }
            | CsvParsingErrorColumnsBadFormat { .. }
            | JsonParsing(_)
            | WeightsCsv(_)
            | InvalidJsonVersion(_) => ErrorKind::Parse,

            InvalidFirstLayerType(_)
            | InvalidLastLayerType(_)
            | InvalidHiddenLayerType { .. }
            | UnimplementedLayerType(_)
            | UnimplementedActivationFunction(_)
            | InvalidModelTopology(_)
            | InvalidModelWeights { .. } => ErrorKind::Structural,

            FileOpen { .. } | FileParserNotOpen | Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn parameter(name: &str, reason: impl Into<String>) -> MlpError {
        MlpError::InvalidParameter {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MlpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_size_message_cites_found_and_expected() {
        let err = MlpError::CsvParsingErrorColumnsSize {
            line: 3,
            found: 20,
            expected: 21,
        };
        assert_eq!(
            err.to_string(),
            "CSV parsing error at line 3: found 20 columns instead of 21"
        );
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(MlpError::InvalidTrainingRatioTooSmall.kind(), ErrorKind::Configuration);
        assert_eq!(
            MlpError::InvalidFirstLayerType("HiddenLayer".into()).kind(),
            ErrorKind::Structural
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(MlpError::from(io).kind(), ErrorKind::Io);
    }
}
