//! MedQR Core - QR labels for repackaged controlled medication
//!
//! This library builds the QR payloads printed on hospital unit-dose labels
//! for psychotropic and narcotic drugs, renders them at a physical print
//! size, decodes what a handheld scanner reads back, and keeps an
//! append-only log of every scan.

pub mod batch;
pub mod decode;
pub mod ecc;
pub mod encode;
pub mod normalize;
pub mod payload;
pub mod record;
pub mod render;
pub mod scanlog;

mod error;

use std::path::PathBuf;

pub use error::{Error, Result};

/// Configuration shared by the encoder, batch runner and scan logger
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the scan log and generated artifacts
    pub data_dir: PathBuf,
    /// File name of the CSV scan log inside `data_dir`
    pub log_file_name: String,
    /// Values applied to records that leave them blank
    pub defaults: record::RecordDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: dirs_home().join(".medqr"),
            log_file_name: "scans_qr.csv".to_string(),
            defaults: record::RecordDefaults::default(),
        }
    }
}

impl Config {
    /// Full path of the CSV scan log
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(&self.log_file_name)
    }
}

fn dirs_home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

// Re-export key types for convenience
pub use batch::{run_batch, BatchReport, TemplateSchema};
pub use decode::{decode_scan, ParseOutcome, ScanStatus};
pub use ecc::EccLevel;
pub use encode::{encode_record, EncodeOptions, EncodedQr};
pub use payload::{PayloadFormat, Selection};
pub use record::{ControlClass, Field, MedicationRecord, RecordDefaults};
pub use render::{FillColor, QrMetrics, RenderedQr};
pub use scanlog::{LogStore, ScanEvent, ScanRecorder};
