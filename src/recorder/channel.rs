//! Recording errors and per-channel sample buffers

use crate::recorder::archive::SampleTable;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during recording
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("No value sequence given for channel {0}")]
    EmptyRecord(String),

    #[error("Value sequences for channel {channel} differ in length (expected {expected}, found {found})")]
    MismatchedLengths {
        channel: String,
        expected: usize,
        found: usize,
    },

    #[error("Channel {channel} was created with {expected} value columns, got {found}")]
    ColumnMismatch {
        channel: String,
        expected: usize,
        found: usize,
    },

    #[error("Storage error on {path:?}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive error on {path:?}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RecordingError {
    pub(crate) fn storage(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| RecordingError::Storage { path, source }
    }

    pub(crate) fn archive(path: impl Into<PathBuf>) -> impl FnOnce(zip::result::ZipError) -> Self {
        let path = path.into();
        move |source| RecordingError::Archive { path, source }
    }
}

/// Result type for recording operations
pub type RecordingResult<T> = Result<T, RecordingError>;

/// Parallel columns of one channel: sample index, elapsed seconds, then
/// one column per recorded value. All columns always have the same length.
#[derive(Debug, Clone)]
pub struct ChannelBuffer {
    columns: Vec<Vec<f64>>,
}

impl ChannelBuffer {
    pub fn new(value_columns: usize) -> Self {
        Self {
            columns: vec![Vec::new(); 2 + value_columns],
        }
    }

    /// Number of value columns (excluding index and time)
    pub fn value_columns(&self) -> usize {
        self.columns.len() - 2
    }

    /// Total number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of buffered time points
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Check a batch against this buffer's shape. Returns the number of
    /// time points it holds.
    pub fn validate<V: AsRef<[f64]>>(
        channel: &str,
        existing: Option<&ChannelBuffer>,
        values: &[V],
    ) -> RecordingResult<usize> {
        let first = values
            .first()
            .ok_or_else(|| RecordingError::EmptyRecord(channel.to_string()))?;
        let n = first.as_ref().len();

        if let Some(bad) = values.iter().find(|v| v.as_ref().len() != n) {
            return Err(RecordingError::MismatchedLengths {
                channel: channel.to_string(),
                expected: n,
                found: bad.as_ref().len(),
            });
        }

        if let Some(buffer) = existing {
            if buffer.value_columns() != values.len() {
                return Err(RecordingError::ColumnMismatch {
                    channel: channel.to_string(),
                    expected: buffer.value_columns(),
                    found: values.len(),
                });
            }
        }

        Ok(n)
    }

    /// Append a validated batch. Time point `i` is stamped
    /// `elapsed + i * dt`.
    pub(crate) fn append<V: AsRef<[f64]>>(
        &mut self,
        sample_index: u64,
        elapsed: f64,
        dt: f64,
        values: &[V],
    ) {
        let n = values.first().map_or(0, |v| v.as_ref().len());

        self.columns[0].extend(std::iter::repeat(sample_index as f64).take(n));
        self.columns[1].extend((0..n).map(|i| elapsed + i as f64 * dt));
        for (column, batch) in self.columns[2..].iter_mut().zip(values) {
            column.extend_from_slice(batch.as_ref());
        }
    }

    /// Row-major table: one row per time point, one column per buffered column
    pub fn to_table(&self) -> SampleTable {
        let rows = self.len();
        let cols = self.width();
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            data.extend(self.columns.iter().map(|column| column[row]));
        }
        SampleTable::new(rows, cols, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_stamps_time_points() {
        let mut buffer = ChannelBuffer::new(1);
        buffer.append(5, 1.0, 0.1, &[[10.0, 20.0]]);

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.column(0).unwrap(), &[5.0, 5.0]);
        let times = buffer.column(1).unwrap();
        assert_eq!(times[0], 1.0);
        assert!((times[1] - 1.1).abs() < 1e-12);
        assert_eq!(buffer.column(2).unwrap(), &[10.0, 20.0]);
    }

    #[test]
    fn test_to_table_transposes() {
        let mut buffer = ChannelBuffer::new(2);
        buffer.append(1, 0.0, 0.5, &[[3.0, 4.0], [-3.0, -4.0]]);

        let table = buffer.to_table();
        assert_eq!((table.rows(), table.cols()), (2, 4));
        assert_eq!(table.row(0), &[1.0, 0.0, 3.0, -3.0]);
        assert_eq!(table.row(1), &[1.0, 0.5, 4.0, -4.0]);
    }

    #[test]
    fn test_validate_rejects_bad_batches() {
        let none: &[Vec<f64>] = &[];
        assert!(matches!(
            ChannelBuffer::validate("I", None, none),
            Err(RecordingError::EmptyRecord(name)) if name == "I"
        ));

        assert!(matches!(
            ChannelBuffer::validate("xy", None, &[vec![1.0], vec![1.0, 2.0]]),
            Err(RecordingError::MismatchedLengths { expected: 1, found: 2, .. })
        ));

        let existing = ChannelBuffer::new(3);
        assert!(matches!(
            ChannelBuffer::validate("xyz", Some(&existing), &[[1.0], [2.0]]),
            Err(RecordingError::ColumnMismatch { expected: 3, found: 2, .. })
        ));

        assert_eq!(ChannelBuffer::validate("V", None, &[[1.0, 2.0, 3.0]]).unwrap(), 3);
    }

    #[test]
    fn test_empty_batch_keeps_columns_aligned() {
        let mut buffer = ChannelBuffer::new(1);
        buffer.append(0, 0.0, 0.1, &[Vec::<f64>::new()]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.to_table().rows(), 0);
        assert_eq!(buffer.to_table().cols(), 3);
    }
}
