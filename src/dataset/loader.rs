//! CSV loader for the raw penguin measurements.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::DatasetError;
use super::table::{MISSING_MARKERS, RawTable};

/// Parse a comma-delimited file with a header row into a [`RawTable`].
///
/// Cells are trimmed; any spelling in [`MISSING_MARKERS`] becomes `None`.
pub fn load(path: &Path) -> Result<RawTable, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let csv_error = |source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(DatasetError::EmptyTable {
            path: path.to_path_buf(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(parse_cell).collect());
    }
    Ok(RawTable { headers, rows })
}

fn parse_cell(cell: &str) -> Option<String> {
    if MISSING_MARKERS.contains(&cell) {
        None
    } else {
        Some(cell.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_headers_and_missing_markers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("palmer.csv");
        std::fs::write(
            &path,
            "species,island,bill_length_mm,sex\nAdelie,Torgersen,39.1,male\nAdelie,Torgersen, NA ,\n",
        )
        .unwrap();

        let table = load(&path).unwrap();

        assert_eq!(table.headers, vec!["species", "island", "bill_length_mm", "sex"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][2].as_deref(), Some("39.1"));
        assert_eq!(table.rows[1][2], None);
        assert_eq!(table.rows[1][3], None);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::Read { .. }));
    }

    #[test]
    fn ragged_rows_are_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,2\n3\n").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, DatasetError::Csv { .. }));
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, DatasetError::EmptyTable { .. }));
    }
}
