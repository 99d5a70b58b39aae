//! Ledger export loading.
//!
//! The export is a `;`-delimited text file in the Windows-1252 code page.
//! Every field is kept as raw text; typing happens in [`crate::normalizer`].

use std::path::Path;

use encoding_rs::WINDOWS_1252;
use report_core::error::IngestError;
use report_core::models::RawTable;
use tracing::debug;

/// Field separator of the ledger export.
pub const DELIMITER: u8 = b';';

// ── Public API ────────────────────────────────────────────────────────────────

/// Read and split the ledger at `path`.
///
/// A leading UTF-8 byte-order mark switches decoding to UTF-8; otherwise
/// bytes are read as Windows-1252. Short lines are padded with empty cells
/// and cells past the last header column are dropped.
pub fn load_table(path: &Path) -> Result<RawTable, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    // Windows-1252 maps every byte, so decoding itself cannot fail.
    let (text, encoding, _) = WINDOWS_1252.decode(&bytes);
    debug!("Reading {} as {}", path.display(), encoding.name());

    parse_table(path, &text)
}

/// Split already-decoded ledger text into a [`RawTable`].
///
/// `path` is only used for error messages.
pub fn parse_table(path: &Path, text: &str) -> Result<RawTable, IngestError> {
    if text.trim().is_empty() {
        return Err(IngestError::EmptyFile(path.to_path_buf()));
    }

    let mut reader = reader_builder().from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(IngestError::NoColumns(path.to_path_buf()));
    }

    let width = headers.len();
    let mut rows = Vec::new();
    let mut ragged = 0usize;

    for record in reader.records() {
        let record = record.map_err(|source| csv_error(path, source))?;
        if record.len() != width {
            ragged += 1;
        }
        let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    if ragged > 0 {
        debug!(
            "{} lines in {} did not have {} fields",
            ragged,
            path.display(),
            width
        );
    }
    debug!(
        "Loaded {} rows x {} columns from {}",
        rows.len(),
        width,
        path.display()
    );

    Ok(RawTable {
        source: path.to_path_buf(),
        headers,
        rows,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true);
    builder
}

fn csv_error(path: &Path, source: csv::Error) -> IngestError {
    IngestError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_bytes(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_load_windows_1252_header() {
        let dir = TempDir::new().unwrap();
        // "Dt. Emiss\xe3o" is "Dt. Emissão" in Windows-1252.
        let path = write_bytes(
            &dir,
            "ledger.csv",
            b"Loja;Dt. Emiss\xe3o;Vlr. Documento\n5;01/03/2024;100,00\n",
        );

        let table = load_table(&path).unwrap();

        assert_eq!(table.headers, vec!["Loja", "Dt. Emissão", "Vlr. Documento"]);
        assert_eq!(table.rows, vec![vec!["5", "01/03/2024", "100,00"]]);
        assert_eq!(table.source, path);
    }

    #[test]
    fn test_load_maps_every_byte() {
        let dir = TempDir::new().unwrap();
        // 0x81 has no Windows-1252 character but still decodes.
        let path = write_bytes(&dir, "odd.csv", b"Loja;Fornecedor\n5;A\x81B\n");

        let table = load_table(&path).unwrap();
        assert_eq!(table.rows[0][1].chars().count(), 3);
    }

    #[test]
    fn test_load_utf8_with_bom() {
        let dir = TempDir::new().unwrap();
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("Loja;Observações\n7;ok\n".as_bytes());
        let path = write_bytes(&dir, "bom.csv", &bytes);

        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Loja", "Observações"]);
    }

    #[test]
    fn test_headers_are_trimmed() {
        let table = parse_table(Path::new("t.csv"), " Loja ; Vlr. Documento \n1;2\n").unwrap();
        assert_eq!(table.headers, vec!["Loja", "Vlr. Documento"]);
    }

    #[test]
    fn test_cells_are_raw_text() {
        let table = parse_table(Path::new("t.csv"), "Loja;Vlr. Documento\n005; 1.234,56\n").unwrap();
        assert_eq!(table.rows[0], vec!["005", " 1.234,56"]);
    }

    #[test]
    fn test_ragged_lines_are_padded_and_truncated() {
        let table = parse_table(Path::new("t.csv"), "a;b;c\n1\n1;2;3;4\n").unwrap();
        assert_eq!(table.rows[0], vec!["1", "", ""]);
        assert_eq!(table.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_header_only_has_no_rows() {
        let table = parse_table(Path::new("t.csv"), "Loja;Dt. Emissão\n").unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(table.headers.len(), 2);
    }

    #[test]
    fn test_empty_file() {
        let err = parse_table(Path::new("e.csv"), "  \n").unwrap_err();
        assert!(matches!(err, IngestError::EmptyFile(_)));
    }

    #[test]
    fn test_blank_header_has_no_columns() {
        let err = parse_table(Path::new("n.csv"), ";;\n1;2;3\n").unwrap_err();
        assert!(matches!(err, IngestError::NoColumns(_)));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = load_table(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, IngestError::FileRead { .. }));
    }
}
