use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown direction value {value:?} in column '{column}' (feature row {row})")]
    UnknownDirection {
        column: String,
        row: usize,
        value: Option<String>,
    },
    #[error("Column '{0}' not found")]
    MissingColumn(String),
    #[error("Column '{column}' must be {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },
    #[error("Column '{column}' has {found} values, expected {expected}")]
    ColumnLength {
        column: String,
        found: usize,
        expected: usize,
    },
    #[error("Cannot find weight column '{0}'")]
    MissingWeight(String),
    #[error("Invalid rules: {0}")]
    InvalidRules(String),
    #[error("Breaks must be non-empty, finite and strictly increasing, got {0:?}")]
    InvalidBreaks(Vec<f64>),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Negative travel time {cost} in feature row {row}")]
    NegativeCost { row: usize, cost: f64 },
    #[error("Network has no lines left after {0}")]
    EmptyNetwork(&'static str),
}
