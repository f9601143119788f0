use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// The only fatal condition: nothing can be shown without inventory.
    #[error("Missing {}. Please run process_data.py first.", .path.display())]
    MissingInventory { path: PathBuf },

    #[error("unsupported table format for {}: expected .parquet or .csv", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("{table}: required column '{column}' not found")]
    MissingColumn { table: &'static str, column: &'static str },

    #[error("{table}: column '{column}' has unusable type {data_type}")]
    ColumnType {
        table: &'static str,
        column: &'static str,
        data_type: String,
    },

    #[error("{table}: row {row} has no value in required column '{column}'")]
    NullValue {
        table: &'static str,
        column: &'static str,
        row: usize,
    },

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: String, end: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
