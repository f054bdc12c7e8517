use thiserror::Error;

use super::model::Field;

/// Result alias used throughout the catalog engine.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Everything that can go wrong while reading or analysing a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The container could not be opened or traversed.
    #[error("cannot read container: {0}")]
    ContainerRead(String),

    /// No `x` coordinate could be resolved by any adapter.
    #[error("could not find valid x, y, z coordinates in {0}")]
    MissingCoordinates(String),

    /// A request referenced a field the record set does not carry.
    #[error("field '{0}' is not present in the catalog")]
    FieldNotFound(Field),

    /// A reduction (min, max, mean, ...) was asked of an empty array.
    #[error("cannot compute {op} of an empty '{field}' array")]
    EmptyReduction { op: &'static str, field: Field },

    /// A schema map pointed at a path the container does not hold.
    #[error("dataset '{0}' not found in container")]
    DatasetNotFound(String),

    #[error("dataset '{path}' has shape {shape:?}, expected {expected}")]
    ShapeMismatch {
        path: String,
        shape: Vec<usize>,
        expected: &'static str,
    },

    #[error("field '{field}' has {found} values, expected {expected}")]
    LengthMismatch {
        field: Field,
        expected: usize,
        found: usize,
    },

    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Parse(String),

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
