//! Append-only scan log
//!
//! Every scan becomes one [`ScanEvent`], appended to a [`LogStore`] and
//! flushed before the next scan is read. Stores are injected, so tests run
//! against [`MemoryLogStore`] and the CLI against [`CsvLogStore`],
//! optionally mirrored to [`JsonLinesLogStore`].

mod csv_store;
mod jsonl;
mod memory;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::decode::{decode_scan, ParseOutcome, ScanStatus};
use crate::record::{Field, MedicationRecord};
use crate::Result;

pub use csv_store::CsvLogStore;
pub use jsonl::JsonLinesLogStore;
pub use memory::MemoryLogStore;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed header of the log table
pub fn log_columns() -> Vec<&'static str> {
    let mut columns = vec!["timestamp"];
    columns.extend(Field::ALL.iter().map(|f| f.key()));
    columns.push("raw");
    columns
}

/// One scan, as logged
#[derive(Debug, Clone, Serialize)]
pub struct ScanEvent {
    pub timestamp: String,
    pub raw: String,
    pub status: ScanStatus,
    pub warnings: Vec<String>,
    pub record: MedicationRecord,
}

impl ScanEvent {
    pub fn new(at: NaiveDateTime, raw: &str, outcome: ParseOutcome) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            raw: raw.to_string(),
            status: outcome.status(),
            warnings: outcome.messages(),
            record: outcome.into_record(),
        }
    }

    /// Decode `raw` and stamp it with the current local time
    pub fn capture(raw: &str) -> Self {
        Self::new(Local::now().naive_local(), raw, decode_scan(raw))
    }

    /// Row values in [`log_columns`] order
    pub fn row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(Field::ALL.len() + 2);
        row.push(self.timestamp.clone());
        row.extend(Field::ALL.iter().map(|f| self.record.get(*f).to_string()));
        row.push(self.raw.clone());
        row
    }
}

/// Destination for scan events
pub trait LogStore {
    /// Append one event
    fn append(&mut self, event: &ScanEvent) -> Result<()>;

    /// Push appended events to stable storage
    fn flush(&mut self) -> Result<()>;
}

impl<S: LogStore + ?Sized> LogStore for Box<S> {
    fn append(&mut self, event: &ScanEvent) -> Result<()> {
        (**self).append(event)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Writes to a primary store, then to a mirror
///
/// There is no rollback: a failure between the two appends leaves the
/// mirror one event behind.
pub struct Mirrored<P, M> {
    primary: P,
    mirror: M,
}

impl<P: LogStore, M: LogStore> Mirrored<P, M> {
    pub fn new(primary: P, mirror: M) -> Self {
        Self { primary, mirror }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn mirror(&self) -> &M {
        &self.mirror
    }
}

impl<P: LogStore, M: LogStore> LogStore for Mirrored<P, M> {
    fn append(&mut self, event: &ScanEvent) -> Result<()> {
        self.primary.append(event)?;
        self.mirror.append(event)
    }

    fn flush(&mut self) -> Result<()> {
        self.primary.flush()?;
        self.mirror.flush()
    }
}

/// Decodes scans and persists each one immediately
pub struct ScanRecorder<S> {
    store: S,
    recorded: usize,
}

impl<S: LogStore> ScanRecorder<S> {
    pub fn new(store: S) -> Self {
        Self { store, recorded: 0 }
    }

    /// Decode, append and flush one scan
    pub fn record(&mut self, raw: &str) -> Result<ScanEvent> {
        let event = ScanEvent::capture(raw);
        self.record_event(&event)?;
        Ok(event)
    }

    pub fn record_event(&mut self, event: &ScanEvent) -> Result<()> {
        self.store.append(event)?;
        self.store.flush()?;
        self.recorded += 1;
        match event.status {
            ScanStatus::Failed => tracing::warn!("scan logged without fields: {}", event.warnings.join("; ")),
            _ => tracing::info!("scan logged: {} {}", event.record.display_name(), event.record.batch),
        }
        Ok(())
    }

    pub fn recorded(&self) -> usize {
        self.recorded
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .and_then(|d| d.and_hms_opt(9, 26, 53))
            .unwrap()
    }

    #[test]
    fn test_columns_and_row_align() {
        let event = ScanEvent::new(at(), "LOTE: ABC123", decode_scan("LOTE: ABC123"));
        let columns = log_columns();
        let row = event.row();
        assert_eq!(columns.len(), row.len());
        assert_eq!(columns[0], "timestamp");
        assert_eq!(row[0], "2025-03-14 09:26:53");
        let batch = columns.iter().position(|c| *c == "lote").unwrap();
        assert_eq!(row[batch], "ABC123");
        assert_eq!(row.last().unwrap(), "LOTE: ABC123");
    }

    #[test]
    fn test_failed_scan_still_logged() {
        let mut recorder = ScanRecorder::new(MemoryLogStore::default());
        let event = recorder.record("garbage").unwrap();
        assert_eq!(event.status, ScanStatus::Failed);
        assert_eq!(recorder.recorded(), 1);
        assert_eq!(recorder.store().events().len(), 1);
        assert_eq!(recorder.store().flushes(), 1);
        assert!(recorder.store().events()[0].record.is_empty());
    }

    #[test]
    fn test_mirrored_appends_to_both() {
        let store = Mirrored::new(MemoryLogStore::default(), MemoryLogStore::default());
        let mut recorder = ScanRecorder::new(store);
        recorder.record("LOTE: A1").unwrap();
        recorder.record("LOTE: A2").unwrap();
        assert_eq!(recorder.store().primary().events().len(), 2);
        assert_eq!(recorder.store().mirror().events().len(), 2);
        assert_eq!(recorder.store().mirror().events()[1].record.batch, "A2");
    }

    #[test]
    fn test_boxed_store() {
        let store: Box<dyn LogStore> = Box::new(MemoryLogStore::default());
        let mut recorder = ScanRecorder::new(store);
        assert!(recorder.record("LOTE: B1").is_ok());
    }
}
