//! CSV log table

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::scanlog::{log_columns, LogStore, ScanEvent};
use crate::Result;

/// Append-only CSV table with a fixed header row
pub struct CsvLogStore {
    path: PathBuf,
    writer: csv::Writer<File>,
}

/// Does the existing file start with exactly our header?
fn header_matches(path: &Path) -> bool {
    let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(path) {
        Ok(r) => r,
        Err(_) => return false,
    };
    match reader.headers() {
        Ok(headers) => headers.iter().eq(log_columns()),
        Err(_) => false,
    }
}

impl CsvLogStore {
    /// Open or create the table
    ///
    /// An existing file whose header differs from the expected columns is
    /// truncated and re-headed; its previous rows are lost.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let has_content = fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);
        let writer = if has_content && header_matches(&path) {
            let file = OpenOptions::new().append(true).open(&path)?;
            csv::Writer::from_writer(file)
        } else {
            if has_content {
                tracing::warn!("log header mismatch in {}, rewriting header", path.display());
            }
            let mut writer = csv::Writer::from_writer(File::create(&path)?);
            writer.write_record(log_columns())?;
            writer.flush()?;
            writer
        };

        tracing::info!("scan log at {}", path.display());
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogStore for CsvLogStore {
    fn append(&mut self, event: &ScanEvent) -> Result<()> {
        self.writer.write_record(event.row())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_scan;
    use chrono::NaiveDate;

    fn event(raw: &str) -> ScanEvent {
        let at = NaiveDate::from_ymd_opt(2025, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap();
        ScanEvent::new(at, raw, decode_scan(raw))
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(path).unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_new_file_gets_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/scans.csv");

        let mut store = CsvLogStore::open(&path).unwrap();
        store.append(&event("LOTE: ABC123")).unwrap();
        store.flush().unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], log_columns());
        assert_eq!(rows[1][0], "2025-01-02 03:04:05");
        assert_eq!(rows[1].last().unwrap(), "LOTE: ABC123");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scans.csv");

        for raw in ["LOTE: A1", "LOTE: A2"] {
            let mut store = CsvLogStore::open(&path).unwrap();
            store.append(&event(raw)).unwrap();
            store.flush().unwrap();
        }

        assert_eq!(read_rows(&path).len(), 3);
    }

    #[test]
    fn test_mismatched_header_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scans.csv");
        fs::write(&path, "timestamp,nombre,raw\n2024,x,y\n").unwrap();

        let mut store = CsvLogStore::open(&path).unwrap();
        store.append(&event("LOTE: A1")).unwrap();
        store.flush().unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], log_columns());
    }

    #[test]
    fn test_multiline_raw_is_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scans.csv");

        let mut store = CsvLogStore::open(&path).unwrap();
        store.append(&event("LOTE: A1\nVENCE: 12/2025")).unwrap();
        store.flush().unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].last().unwrap(), "LOTE: A1\nVENCE: 12/2025");
    }
}
