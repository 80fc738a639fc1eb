use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Network(#[from] roadnet_core::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Column '{0}' not found")]
    MissingColumn(String),
    #[error("Invalid WKT in row {row}: {message}")]
    Wkt { row: usize, message: String },
    #[error("Invalid point id {value:?} in row {row}")]
    InvalidId { row: usize, value: String },
    #[error("GeoJSON error: {0}")]
    GeoJson(String),
}
