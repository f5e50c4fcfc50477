//! Session archive format
//!
//! A session archive is a zip file holding one `<channel>.npy` entry per
//! channel, each a 2-D little-endian `f64` array in C order (NumPy's
//! `.npz` layout). Entries are deflate-compressed.

use crate::recorder::channel::{RecordingError, RecordingResult};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";
const NPY_ALIGNMENT: usize = 64;
const NPY_EXTENSION: &str = ".npy";

/// Fixed-shape, row-major table of doubles
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl SampleTable {
    /// # Panics
    /// If `data` does not hold exactly `rows * cols` values.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), rows * cols, "table data does not match its shape");
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|row| self.data[row * self.cols + col]).collect()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }
}

/// Encode a table as a version 1.0 `.npy` file
pub fn encode_npy(table: &SampleTable) -> Vec<u8> {
    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
        table.rows, table.cols
    );
    // magic + version + header length, then the header, padded so the data
    // starts on an aligned offset and terminated by a newline
    let unpadded = NPY_MAGIC.len() + 2 + 2 + header.len() + 1;
    let padding = (NPY_ALIGNMENT - unpadded % NPY_ALIGNMENT) % NPY_ALIGNMENT;
    header.extend(std::iter::repeat(' ').take(padding));
    header.push('\n');

    let mut bytes = Vec::with_capacity(unpadded + padding + table.data.len() * 8);
    bytes.extend_from_slice(NPY_MAGIC);
    bytes.extend_from_slice(&[1, 0]);
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    for value in &table.data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode a 2-D `<f8` C-order `.npy` file
pub fn decode_npy(bytes: &[u8]) -> RecordingResult<SampleTable> {
    if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
        return Err(RecordingError::Format("missing NPY magic".to_string()));
    }

    let (header_len, header_start) = match bytes[6] {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 if bytes.len() >= 12 => (
            u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
            12,
        ),
        major => {
            return Err(RecordingError::Format(format!(
                "unsupported NPY version {}",
                major
            )))
        }
    };

    let data_start = header_start + header_len;
    let header = bytes
        .get(header_start..data_start)
        .and_then(|h| std::str::from_utf8(h).ok())
        .ok_or_else(|| RecordingError::Format("truncated NPY header".to_string()))?;

    if !header.contains("'descr': '<f8'") {
        return Err(RecordingError::Format(format!("unsupported dtype in {}", header.trim())));
    }
    if !header.contains("'fortran_order': False") {
        return Err(RecordingError::Format("Fortran-ordered arrays are not supported".to_string()));
    }

    let (rows, cols) = parse_shape(header)?;
    let payload = &bytes[data_start..];
    if payload.len() != rows * cols * 8 {
        return Err(RecordingError::Format(format!(
            "expected {} data bytes for shape ({}, {}), found {}",
            rows * cols * 8,
            rows,
            cols,
            payload.len()
        )));
    }

    let data = payload
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect();

    Ok(SampleTable::new(rows, cols, data))
}

fn parse_shape(header: &str) -> RecordingResult<(usize, usize)> {
    let start = header
        .find("'shape': (")
        .map(|i| i + "'shape': (".len())
        .ok_or_else(|| RecordingError::Format("NPY header has no shape".to_string()))?;
    let end = header[start..]
        .find(')')
        .map(|i| start + i)
        .ok_or_else(|| RecordingError::Format("unterminated NPY shape".to_string()))?;

    let dims = header[start..end]
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            d.parse::<usize>()
                .map_err(|_| RecordingError::Format(format!("invalid dimension {:?}", d)))
        })
        .collect::<RecordingResult<Vec<_>>>()?;

    match dims.as_slice() {
        [rows, cols] => Ok((*rows, *cols)),
        _ => Err(RecordingError::Format(format!(
            "expected a 2-D array, found {} dimensions",
            dims.len()
        ))),
    }
}

/// Write one compressed archive holding every table
pub fn write_archive(path: &Path, tables: &BTreeMap<String, SampleTable>) -> RecordingResult<()> {
    let file = std::fs::File::create(path).map_err(RecordingError::storage(path))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, table) in tables {
        zip.start_file(format!("{}{}", name, NPY_EXTENSION), options)
            .map_err(RecordingError::archive(path))?;
        zip.write_all(&encode_npy(table))
            .map_err(RecordingError::storage(path))?;
    }

    zip.finish().map_err(RecordingError::archive(path))?;
    Ok(())
}

/// Read every table of an archive back, keyed by channel name
pub fn read_archive(path: &Path) -> RecordingResult<BTreeMap<String, SampleTable>> {
    let file = std::fs::File::open(path).map_err(RecordingError::storage(path))?;
    let mut archive = ZipArchive::new(file).map_err(RecordingError::archive(path))?;

    let mut tables = BTreeMap::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(RecordingError::archive(path))?;
        let name = entry.name().to_string();
        let Some(channel) = name.strip_suffix(NPY_EXTENSION) else {
            tracing::warn!("Skipping non-array entry {} in {:?}", name, path);
            continue;
        };

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(RecordingError::storage(path))?;

        let table = decode_npy(&bytes).map_err(|e| match e {
            RecordingError::Format(msg) => {
                RecordingError::Format(format!("{} in {:?}: {}", channel, path, msg))
            }
            other => other,
        })?;
        tables.insert(channel.to_string(), table);
    }

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table() -> SampleTable {
        SampleTable::new(2, 3, vec![5.0, 1.0, 10.0, 5.0, 1.1, -20.5])
    }

    #[test]
    fn test_npy_header_is_aligned() {
        let bytes = encode_npy(&table());
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!((10 + header_len) % NPY_ALIGNMENT, 0);
        assert_eq!(bytes[10 + header_len - 1], b'\n');
        assert_eq!(bytes.len(), 10 + header_len + 6 * 8);

        let header = std::str::from_utf8(&bytes[10..10 + header_len]).unwrap();
        assert!(header.contains("'shape': (2, 3)"), "header was {}", header);
    }

    #[test]
    fn test_decode_preserves_special_values() {
        let original = SampleTable::new(1, 4, vec![f64::MIN_POSITIVE, -0.0, f64::INFINITY, 1e-300]);
        let decoded = decode_npy(&encode_npy(&original)).unwrap();
        for (a, b) in original.data().iter().zip(decoded.data()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_decode_rejects_foreign_arrays() {
        assert!(decode_npy(b"not an array").is_err());

        let mut bytes = encode_npy(&table());
        let text = String::from_utf8_lossy(&bytes[10..]).replace("<f8", "<i8");
        bytes.truncate(10);
        bytes.extend_from_slice(text.as_bytes());
        assert!(matches!(decode_npy(&bytes), Err(RecordingError::Format(_))));
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let mut bytes = encode_npy(&table());
        bytes.truncate(bytes.len() - 8);
        assert!(decode_npy(&bytes).is_err());
    }

    #[test]
    fn test_parse_shape_variants() {
        assert_eq!(parse_shape("{'shape': (0, 3), }").unwrap(), (0, 3));
        assert!(parse_shape("{'shape': (4,), }").is_err());
        assert!(parse_shape("{'shape': (1, 2, 3), }").is_err());
    }

    #[test]
    fn test_archive_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.npz");

        let mut tables = BTreeMap::new();
        tables.insert("I".to_string(), table());
        tables.insert("stage_x_y".to_string(), SampleTable::new(1, 4, vec![3.0, 0.25, 10.0, -7.5]));
        write_archive(&path, &tables).unwrap();

        let read = read_archive(&path).unwrap();
        assert_eq!(read, tables);
    }

    #[test]
    fn test_empty_archive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.npz");
        write_archive(&path, &BTreeMap::new()).unwrap();
        assert!(read_archive(&path).unwrap().is_empty());
    }

    #[test]
    fn test_write_into_missing_directory_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("session.npz");
        match write_archive(&path, &BTreeMap::new()) {
            Err(RecordingError::Storage { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected storage error, got {:?}", other),
        }
    }
}
