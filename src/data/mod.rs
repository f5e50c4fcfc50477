//! Experiment data helpers
//!
//! Parameter dumps in JSON or YAML, whitespace-separated column files
//! (optionally gzip-compressed), and the timestamp used to name
//! experiment folders.

pub mod columns;
pub mod info;

pub use columns::load_columns;
pub use info::{date_time_stamp, load_info, save_info};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Format .{0} is unknown")]
    UnknownFormat(String),

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type DataResult<T> = Result<T, DataError>;
