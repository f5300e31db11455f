//! Batch encoding from a CSV template into a zip of PNGs and a manifest

use std::collections::HashSet;
use std::io::{Read, Seek, Write};

use chrono::Local;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::encode::{encode_record, EncodeOptions};
use crate::normalize::{assign, normalize_key, resolve, settle, Target};
use crate::record::{MedicationRecord, RecordDefaults};
use crate::scanlog::TIMESTAMP_FORMAT;
use crate::Result;

const LEGACY_COLUMNS: &[&str] = &[
    "nombre_generico",
    "concentracion",
    "forma_farmaceutica",
    "presentacion",
    "lote",
    "fecha_fabricacion",
    "fecha_vencimiento",
    "registro_sanitario",
    "fabricante",
    "importador",
    "id_hospital",
    "fecha_reempaque",
    "conservacion",
    "advertencias",
    "control",
    "url_qr",
];

const PRODUCT_CODE_COLUMNS: &[&str] = &[
    "nombre_generico",
    "concentracion",
    "forma_farmaceutica",
    "presentacion",
    "codigo_producto",
    "lote",
    "fecha_fabricacion",
    "fecha_vencimiento",
    "registro_sanitario",
    "fabricante",
    "conservacion",
    "advertencias",
    "control",
    "url_qr",
];

const LEGACY_SAMPLE: &[&str] = &[
    "CLONAZEPAM",
    "2 mg",
    "Tableta",
    "Blíster x10",
    "ABC123",
    "04/2024",
    "12/2025",
    "INVIMA 2019M-000000-R1",
    "Laboratorio XYZ S.A.",
    "Import Pharma SAS",
    "Hospital ABC",
    "04/2024",
    "Conservar <25°C",
    "Venta bajo fórmula médica",
    "Psicotrópico",
    "",
];

const PRODUCT_CODE_SAMPLE: &[&str] = &[
    "CLONAZEPAM",
    "2 mg",
    "Tableta",
    "Blíster x10",
    "7702057012345",
    "ABC123",
    "04/2024",
    "12/2025",
    "INVIMA 2019M-000000-R1",
    "Laboratorio XYZ S.A.",
    "Conservar <25°C",
    "Venta bajo fórmula médica",
    "Psicotrópico",
    "",
];

/// Manifest columns appended to the input header when missing
const MANIFEST_EXTRA: &[&str] = &["timestamp", "url_qr", "raw"];

/// Column layouts of the batch input template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateSchema {
    /// Repackaging fields, no product code
    #[default]
    Legacy,
    /// Product code, no importer or repackaging fields
    ProductCode,
}

impl TemplateSchema {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            TemplateSchema::Legacy => LEGACY_COLUMNS,
            TemplateSchema::ProductCode => PRODUCT_CODE_COLUMNS,
        }
    }

    fn sample(self) -> &'static [&'static str] {
        match self {
            TemplateSchema::Legacy => LEGACY_SAMPLE,
            TemplateSchema::ProductCode => PRODUCT_CODE_SAMPLE,
        }
    }

    /// Pick the schema sharing the most columns with `headers`
    ///
    /// Ties go to the legacy schema. Extra headers don't count against
    /// either.
    pub fn detect<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let present: HashSet<String> = headers.into_iter().map(normalize_key).collect();
        let overlap = |schema: TemplateSchema| {
            schema
                .columns()
                .iter()
                .filter(|c| present.contains(**c))
                .count()
        };
        if overlap(TemplateSchema::ProductCode) > overlap(TemplateSchema::Legacy) {
            TemplateSchema::ProductCode
        } else {
            TemplateSchema::Legacy
        }
    }

    /// Header plus one sample row, as CSV text
    pub fn template_csv(self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.columns())?;
        writer.write_record(self.sample())?;
        let bytes = writer
            .into_inner()
            .map_err(|e| crate::Error::InvalidInput(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| crate::Error::InvalidInput(e.to_string()))
    }
}

impl std::str::FromStr for TemplateSchema {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_key(s).as_str() {
            "legacy" => Ok(TemplateSchema::Legacy),
            "product_code" | "codigo" | "codigo_producto" => Ok(TemplateSchema::ProductCode),
            _ => Err(crate::Error::InvalidInput(format!("unknown template schema '{}'", s))),
        }
    }
}

/// A row that was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    /// 1-based data row number
    pub row: usize,
    pub name: String,
    pub reason: String,
}

/// Summary of a batch run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub schema: TemplateSchema,
    /// Archive entry names, in row order
    pub encoded: Vec<String>,
    pub failures: Vec<RowFailure>,
}

/// Build a record from one CSV row
///
/// Headers go through the alias table. Blank cells are skipped so they
/// never overwrite a value set by another column.
fn row_record(headers: &csv::StringRecord, row: &csv::StringRecord) -> MedicationRecord {
    let mut record = MedicationRecord::new();
    let mut deferred = Vec::new();
    for (header, value) in headers.iter().zip(row.iter()) {
        if value.trim().is_empty() {
            continue;
        }
        if let Some(target) = resolve(header) {
            if let Target::SplitIfAlone(rule) = target {
                deferred.push(rule);
            }
            assign(&mut record, target, value);
        }
    }
    for rule in deferred {
        settle(&mut record, rule);
    }
    record
}

fn entry_name(row: usize, record: &MedicationRecord) -> String {
    let slug = normalize_key(&record.name);
    let slug = if slug.is_empty() { "med".to_string() } else { slug };
    format!("qr_{:03}_{}.png", row, slug)
}

/// Encode every row of `input` into `archive`, listing them in `manifest`
///
/// Rows that fail validation are reported in [`BatchReport::failures`] and
/// left out of both outputs. I/O errors on any of the three streams abort
/// the run.
pub fn run_batch<R, W, M>(
    input: R,
    options: &EncodeOptions,
    defaults: &RecordDefaults,
    archive: W,
    manifest: M,
) -> Result<BatchReport>
where
    R: Read,
    W: Write + Seek,
    M: Write,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(input);
    let headers = reader.headers()?.clone();
    let schema = TemplateSchema::detect(headers.iter());
    tracing::debug!("batch input uses {:?} schema ({} columns)", schema, headers.len());

    let mut manifest_header: Vec<String> = headers.iter().map(String::from).collect();
    for extra in MANIFEST_EXTRA {
        if !headers.iter().any(|h| h == *extra) {
            manifest_header.push(extra.to_string());
        }
    }
    let mut manifest = csv::Writer::from_writer(manifest);
    manifest.write_record(&manifest_header)?;

    let mut zip = ZipWriter::new(archive);
    let entry_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut report = BatchReport {
        schema,
        encoded: Vec::new(),
        failures: Vec::new(),
    };

    for (idx, row) in reader.records().enumerate() {
        let row_number = idx + 1;
        let row = row?;
        let mut record = row_record(&headers, &row);
        record.apply_defaults(defaults);

        let encoded = match encode_record(&record, options) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!("row {} skipped: {}", row_number, e);
                report.failures.push(RowFailure {
                    row: row_number,
                    name: record.name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let name = entry_name(row_number, &record);
        zip.start_file(name.as_str(), entry_options)?;
        zip.write_all(&encoded.png)?;

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let manifest_row: Vec<String> = manifest_header
            .iter()
            .enumerate()
            .map(|(i, column)| match column.as_str() {
                "timestamp" => timestamp.clone(),
                "url_qr" => record.url.clone(),
                "raw" => encoded.rendered.payload.clone(),
                _ => row.get(i).unwrap_or_default().to_string(),
            })
            .collect();
        manifest.write_record(&manifest_row)?;

        report.encoded.push(name);
    }

    zip.finish()?;
    manifest.flush()?;

    tracing::info!(
        "batch finished: {} encoded, {} skipped",
        report.encoded.len(),
        report.failures.len()
    );
    Ok(report)
}
