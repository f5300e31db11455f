//! One-call encoding: record in, payload selection and PNG out

use image::DynamicImage;

use crate::ecc::EccLevel;
use crate::payload::{select_payload, PayloadFormat, Selection};
use crate::record::MedicationRecord;
use crate::render::{
    render_physical, FillColor, RenderOptions, RenderedQr, DEFAULT_BORDER_MODULES, DEFAULT_DPI,
    DEFAULT_LOGO_PERCENT, DEFAULT_SIZE_INCHES,
};
use crate::Result;

/// Everything a caller can choose when encoding a label
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub format: PayloadFormat,
    pub ecc: EccLevel,
    pub inches: f32,
    pub dpi: u32,
    pub border: u32,
    pub fill: FillColor,
    pub logo: Option<DynamicImage>,
    pub logo_percent: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            format: PayloadFormat::Text,
            ecc: EccLevel::default(),
            inches: DEFAULT_SIZE_INCHES,
            dpi: DEFAULT_DPI,
            border: DEFAULT_BORDER_MODULES,
            fill: FillColor::default(),
            logo: None,
            logo_percent: DEFAULT_LOGO_PERCENT,
        }
    }
}

/// Result of [`encode_record`]
#[derive(Debug, Clone)]
pub struct EncodedQr {
    pub selection: Selection,
    pub rendered: RenderedQr,
    /// PNG bytes tagged with the print DPI
    pub png: Vec<u8>,
}

impl EncodedQr {
    /// Warnings from both payload selection and rendering
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.selection.fell_back() {
            warnings.push(format!(
                "requested {} payload did not fit, used {}",
                self.selection.requested, self.selection.format
            ));
        }
        warnings.extend(self.rendered.warnings.iter().cloned());
        warnings
    }
}

/// Validate, pick a payload that fits, render and encode to PNG
///
/// Fails only when required fields are missing or the render options are
/// unusable; oversized data degrades through the payload and symbol
/// fallbacks instead.
pub fn encode_record(record: &MedicationRecord, options: &EncodeOptions) -> Result<EncodedQr> {
    record.validate()?;

    // Logo covers modules; always ECC H
    let ecc = if options.logo.is_some() { EccLevel::H } else { options.ecc };
    let selection = select_payload(record, options.format, ecc);
    tracing::debug!(
        "selected {} payload ({} bytes) at ECC {}",
        selection.format,
        selection.byte_len(),
        ecc
    );

    let render_options = RenderOptions {
        inches: options.inches,
        dpi: options.dpi,
        border: options.border,
        ecc,
        fill: options.fill.resolve(record),
        logo: options.logo.clone(),
        logo_percent: options.logo_percent,
    };
    let rendered = render_physical(&selection.payload, &render_options)?;
    let png = rendered.to_png(Some(options.dpi))?;

    tracing::info!(
        "encoded {} as {} (version {}, ECC {}, {} px)",
        record.display_name(),
        selection.format,
        rendered.metrics.version,
        rendered.metrics.ecc,
        rendered.metrics.side_px
    );

    Ok(EncodedQr {
        selection,
        rendered,
        png,
    })
}
