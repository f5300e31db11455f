//! Shared command-line arguments.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use medqr_core::render::load_logo;
use medqr_core::{EccLevel, EncodeOptions, Field, FillColor, MedicationRecord, PayloadFormat};

/// Medication fields, one flag each
#[derive(Args, Debug, Default)]
pub struct RecordArgs {
    /// Start from a JSON file keyed by field name (flags override it)
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Generic name
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub concentration: Option<String>,
    /// Pharmaceutical form (tablet, ampoule...)
    #[arg(long)]
    pub form: Option<String>,
    #[arg(long)]
    pub presentation: Option<String>,
    /// Control class: psicotrópico or estupefaciente
    #[arg(long)]
    pub control: Option<String>,
    /// Sanitary registration number
    #[arg(long)]
    pub registration: Option<String>,
    #[arg(long)]
    pub product_code: Option<String>,
    /// Batch (lot) code
    #[arg(long)]
    pub batch: Option<String>,
    /// Manufacture date (MM/YYYY)
    #[arg(long)]
    pub manufactured: Option<String>,
    /// Expiry date (MM/YYYY)
    #[arg(long)]
    pub expires: Option<String>,
    #[arg(long)]
    pub manufacturer: Option<String>,
    #[arg(long)]
    pub importer: Option<String>,
    /// Repackaging entity
    #[arg(long)]
    pub entity: Option<String>,
    /// Repackaging date (MM/YYYY)
    #[arg(long)]
    pub repackaged: Option<String>,
    #[arg(long)]
    pub storage: Option<String>,
    #[arg(long)]
    pub warnings: Option<String>,
    /// Regulatory citation, "; " separated
    #[arg(long)]
    pub citation: Option<String>,
    /// External URL for the url payload format
    #[arg(long)]
    pub url: Option<String>,
}

impl RecordArgs {
    fn flags(&self) -> [(Field, &Option<String>); 18] {
        [
            (Field::Name, &self.name),
            (Field::Concentration, &self.concentration),
            (Field::Form, &self.form),
            (Field::Presentation, &self.presentation),
            (Field::Control, &self.control),
            (Field::SanitaryRegistration, &self.registration),
            (Field::ProductCode, &self.product_code),
            (Field::Batch, &self.batch),
            (Field::ManufactureDate, &self.manufactured),
            (Field::ExpiryDate, &self.expires),
            (Field::Manufacturer, &self.manufacturer),
            (Field::Importer, &self.importer),
            (Field::RepackagingEntity, &self.entity),
            (Field::RepackagingDate, &self.repackaged),
            (Field::Storage, &self.storage),
            (Field::Warnings, &self.warnings),
            (Field::RegulatoryCitation, &self.citation),
            (Field::Url, &self.url),
        ]
    }

    /// Build the record from the optional JSON file and the flags
    pub fn to_record(&self) -> anyhow::Result<MedicationRecord> {
        let mut record = match &self.record {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => MedicationRecord::new(),
        };
        for (field, value) in self.flags() {
            if let Some(value) = value {
                record.set(field, value);
            }
        }
        Ok(record)
    }
}

/// Payload and print settings
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Payload format: text, text-compact, json, html, html-base64, url
    #[arg(short, long, default_value = "text")]
    pub format: PayloadFormat,
    /// Error correction level: L, M, Q or H
    #[arg(long, default_value = "Q")]
    pub ecc: EccLevel,
    /// Printed side length in inches
    #[arg(long, default_value_t = 1.5)]
    pub inches: f32,
    #[arg(long, default_value_t = 300)]
    pub dpi: u32,
    /// Quiet zone in modules
    #[arg(long, default_value_t = 4)]
    pub border: u32,
    /// Module colour: auto, black, green, yellow or #rrggbb
    #[arg(long, default_value = "auto")]
    pub color: FillColor,
    /// Centre logo image (forces ECC H)
    #[arg(long, value_name = "FILE")]
    pub logo: Option<PathBuf>,
    /// Logo size as a percentage of the QR side
    #[arg(long, default_value_t = 20)]
    pub logo_percent: u32,
}

impl RenderArgs {
    pub fn to_options(&self) -> anyhow::Result<EncodeOptions> {
        let logo = match &self.logo {
            Some(path) => Some(load_logo(path).with_context(|| format!("loading logo {}", path.display()))?),
            None => None,
        };
        Ok(EncodeOptions {
            format: self.format,
            ecc: self.ecc,
            inches: self.inches,
            dpi: self.dpi,
            border: self.border,
            fill: self.color,
            logo,
            logo_percent: self.logo_percent,
        })
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub record: RecordArgs,

    #[command(flatten)]
    pub render: RenderArgs,

    /// Output PNG; defaults to qr_<name>.png in the current directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also draw the symbol in the terminal
    #[arg(long)]
    pub preview: bool,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// CSV file following one of the templates
    pub input: PathBuf,

    #[command(flatten)]
    pub render: RenderArgs,

    /// Zip archive to write
    #[arg(short, long, default_value = "qrs_medicamentos.zip")]
    pub output: PathBuf,

    /// Manifest CSV; defaults to the archive path with a .csv extension
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// CSV log file; defaults to scans_qr.csv in the data directory
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Also append every scan to this JSON-lines file
    #[arg(long, value_name = "FILE")]
    pub mirror: Option<PathBuf>,

    /// Treat each scan as several lines ending with a blank line
    #[arg(long)]
    pub multiline: bool,
}
