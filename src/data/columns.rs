//! Column file loader
//!
//! The first line names the variables, separated by whitespace; each
//! following line holds one value per variable. Files ending in `.gz` are
//! decompressed on the fly. Blank lines and `#` comments are skipped.

use crate::data::{DataError, DataResult};
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Load a column file into a map of variable name → values
pub fn load_columns<P: AsRef<Path>>(path: P) -> DataResult<BTreeMap<String, Vec<f64>>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let compressed = path.extension().is_some_and(|e| e == "gz");
    let columns = if compressed {
        parse_columns(BufReader::new(GzDecoder::new(file)))?
    } else {
        parse_columns(BufReader::new(file))?
    };

    tracing::debug!(
        "Loaded {} columns from {:?} (compressed={})",
        columns.len(),
        path,
        compressed
    );
    Ok(columns)
}

fn parse_columns<R: BufRead>(reader: R) -> DataResult<BTreeMap<String, Vec<f64>>> {
    let mut lines = reader.lines();

    let header = lines.next().transpose()?.unwrap_or_default();
    let names: Vec<String> = header.split_whitespace().map(str::to_string).collect();
    if names.is_empty() {
        return Err(DataError::Parse {
            line: 1,
            message: "missing header".to_string(),
        });
    }

    let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for (index, line) in lines.enumerate() {
        let line = line?;
        let line_number = index + 2;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let row = trimmed
            .split_whitespace()
            .map(|cell| {
                cell.parse::<f64>().map_err(|_| DataError::Parse {
                    line: line_number,
                    message: format!("not a number: {:?}", cell),
                })
            })
            .collect::<DataResult<Vec<f64>>>()?;

        if row.len() != names.len() {
            return Err(DataError::Parse {
                line: line_number,
                message: format!("expected {} values, found {}", names.len(), row.len()),
            });
        }

        for (column, value) in values.iter_mut().zip(row) {
            column.push(value);
        }
    }

    Ok(names.into_iter().zip(values).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    const TABLE: &str = "t I V\n0.0 1.5 -70\n# drift check\n\n0.1 2.5 -69.5\n";

    #[test]
    fn test_plain_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trace.txt");
        std::fs::write(&path, TABLE).unwrap();

        let columns = load_columns(&path).unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns["t"], vec![0.0, 0.1]);
        assert_eq!(columns["I"], vec![1.5, 2.5]);
        assert_eq!(columns["V"], vec![-70.0, -69.5]);
    }

    #[test]
    fn test_gzip_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trace.txt.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(TABLE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let columns = load_columns(&path).unwrap();
        assert_eq!(columns["V"], vec![-70.0, -69.5]);
    }

    #[test]
    fn test_header_only() {
        let columns = parse_columns("a b\n".as_bytes()).unwrap();
        assert_eq!(columns["a"], Vec::<f64>::new());
        assert_eq!(columns["b"], Vec::<f64>::new());
    }

    #[test]
    fn test_ragged_row_names_line() {
        match parse_columns("a b\n1 2\n3\n".as_bytes()) {
            Err(DataError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_cell_and_empty_file() {
        assert!(matches!(
            parse_columns("a\nx\n".as_bytes()),
            Err(DataError::Parse { line: 2, .. })
        ));
        assert!(parse_columns("".as_bytes()).is_err());
    }
}
