//! Error types for Tephra

use thiserror::Error;

/// Main error type for Tephra operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Bad D8 flow direction code {code} at ({row}, {col})")]
    BadDirectionCode { code: u8, row: usize, col: usize },

    #[error("Malformed scenario list: {0}")]
    MalformedScenarioList(String),

    #[error("Start point ({x}, {y}) falls outside the raster extent")]
    StartPointOutsideExtent { x: f64, y: f64 },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Tephra operations
pub type Result<T> = std::result::Result<T, Error>;
