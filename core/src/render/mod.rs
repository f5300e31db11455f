//! Physical-size QR rendering
//!
//! Labels are printed at a known size and resolution, so the raster is
//! planned from the target side in pixels: the integer module size is the
//! largest that fits, and any flooring remainder becomes extra white margin.

mod logo;
mod png;
mod symbol;

use image::{DynamicImage, Rgb, RgbImage};

use crate::ecc::EccLevel;
use crate::record::MedicationRecord;
use crate::{Error, Result};

pub use logo::{composite_logo, load_logo, DEFAULT_LOGO_PERCENT};
pub use png::encode_png;
pub use symbol::{build_symbol, Symbol, SymbolFallback};

pub const MM_PER_INCH: f32 = 25.4;

/// Modules below this size are unreliable for typical laser and camera readers
pub const MIN_LEGIBLE_MODULE_MM: f32 = 0.33;

/// Quiet zone width in modules
pub const DEFAULT_BORDER_MODULES: u32 = 4;

pub const DEFAULT_SIZE_INCHES: f32 = 1.5;
pub const DEFAULT_DPI: u32 = 300;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Dark-module colour policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FillColor {
    /// Green for psychotropics, yellow for narcotics
    #[default]
    Auto,
    Black,
    Psychotropic,
    Narcotic,
    Custom([u8; 3]),
}

impl FillColor {
    pub fn resolve(self, record: &MedicationRecord) -> Rgb<u8> {
        use crate::record::ControlClass;
        match self {
            FillColor::Auto => Rgb(record.control_class().accent_rgb()),
            FillColor::Black => Rgb([0, 0, 0]),
            FillColor::Psychotropic => Rgb(ControlClass::Psychotropic.accent_rgb()),
            FillColor::Narcotic => Rgb(ControlClass::Narcotic.accent_rgb()),
            FillColor::Custom(rgb) => Rgb(rgb),
        }
    }
}

impl std::str::FromStr for FillColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "auto" => return Ok(FillColor::Auto),
            "black" => return Ok(FillColor::Black),
            "green" | "psychotropic" => return Ok(FillColor::Psychotropic),
            "yellow" | "narcotic" => return Ok(FillColor::Narcotic),
            _ => {}
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
        };
        match (hex.len(), channel(0), channel(2), channel(4)) {
            (6, Some(r), Some(g), Some(b)) => Ok(FillColor::Custom([r, g, b])),
            _ => Err(Error::InvalidInput(format!("unknown colour: {}", s))),
        }
    }
}

/// Physical rendering parameters
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub inches: f32,
    pub dpi: u32,
    pub border: u32,
    pub ecc: EccLevel,
    pub fill: Rgb<u8>,
    pub logo: Option<DynamicImage>,
    pub logo_percent: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            inches: DEFAULT_SIZE_INCHES,
            dpi: DEFAULT_DPI,
            border: DEFAULT_BORDER_MODULES,
            ecc: EccLevel::default(),
            fill: Rgb([0, 0, 0]),
            logo: None,
            logo_percent: DEFAULT_LOGO_PERCENT,
        }
    }
}

/// Sizing diagnostics reported with every render
#[derive(Debug, Clone, PartialEq)]
pub struct QrMetrics {
    pub version: i16,
    pub ecc: EccLevel,
    /// Modules per side of the symbol, quiet zone excluded
    pub symbol_modules: u32,
    /// Symbol modules plus both quiet zones
    pub total_modules: u32,
    pub module_px: u32,
    pub module_mm: f32,
    pub side_px: u32,
    pub fallback: SymbolFallback,
}

impl QrMetrics {
    pub fn is_legible(&self) -> bool {
        self.module_mm >= MIN_LEGIBLE_MODULE_MM
    }
}

/// A rendered QR raster
#[derive(Debug, Clone)]
pub struct RenderedQr {
    pub image: RgbImage,
    /// Text actually carried by the symbol
    pub payload: String,
    pub metrics: QrMetrics,
    pub warnings: Vec<String>,
}

impl RenderedQr {
    pub fn to_png(&self, dpi: Option<u32>) -> Result<Vec<u8>> {
        encode_png(&self.image, dpi)
    }
}

/// Target side length in pixels for a physical size
pub fn target_side_px(inches: f32, dpi: u32) -> u32 {
    (inches * dpi as f32).round() as u32
}

/// Draw the symbol at an integer module size with a quiet zone
fn draw_modules(symbol: &Symbol, module_px: u32, border: u32, fill: Rgb<u8>) -> RgbImage {
    let width = symbol.width();
    let side = (width + 2 * border) * module_px;
    let mut img = RgbImage::from_pixel(side, side, WHITE);

    for (i, color) in symbol.code.to_colors().iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let x0 = ((i as u32) % width + border) * module_px;
        let y0 = ((i as u32) / width + border) * module_px;
        for dy in 0..module_px {
            for dx in 0..module_px {
                img.put_pixel(x0 + dx, y0 + dy, fill);
            }
        }
    }

    img
}

/// Render `payload` so its side matches `inches` at `dpi`
///
/// A logo forces level H. The raster is centred on a white canvas of
/// exactly the target side unless even one pixel per module overflows it.
pub fn render_physical(payload: &str, options: &RenderOptions) -> Result<RenderedQr> {
    if options.dpi == 0 || !(options.inches > 0.0) {
        return Err(Error::InvalidInput(format!(
            "print size must be positive (got {} in at {} dpi)",
            options.inches, options.dpi
        )));
    }

    let requested = if options.logo.is_some() { EccLevel::H } else { options.ecc };
    let symbol = build_symbol(payload, requested)?;

    let target = target_side_px(options.inches, options.dpi);
    let total_modules = symbol.width() + 2 * options.border;
    let module_px = (target / total_modules).max(1);
    let qr = draw_modules(&symbol, module_px, options.border, options.fill);
    let qr_side = qr.width();

    let mut image = if qr_side < target {
        let mut canvas = RgbImage::from_pixel(target, target, WHITE);
        let offset = ((target - qr_side) / 2) as i64;
        image::imageops::replace(&mut canvas, &qr, offset, offset);
        canvas
    } else {
        qr
    };

    if let Some(logo) = &options.logo {
        composite_logo(&mut image, logo, qr_side, options.logo_percent);
    }

    let module_mm = module_px as f32 * MM_PER_INCH / options.dpi as f32;
    let metrics = QrMetrics {
        version: symbol.version(),
        ecc: symbol.ecc,
        symbol_modules: symbol.width(),
        total_modules,
        module_px,
        module_mm,
        side_px: image.width(),
        fallback: symbol.fallback,
    };

    let mut warnings = Vec::new();
    if !metrics.is_legible() {
        let msg = format!(
            "module size {:.2} mm is below {:.2} mm; increase print size or shorten the payload",
            module_mm, MIN_LEGIBLE_MODULE_MM
        );
        tracing::warn!("{}", msg);
        warnings.push(msg);
    }
    if qr_side > target {
        let msg = format!("raster is {} px, larger than the {} px target", qr_side, target);
        tracing::warn!("{}", msg);
        warnings.push(msg);
    }
    match symbol.fallback {
        SymbolFallback::None => {}
        SymbolFallback::Truncated => warnings.push("payload truncated to fit the symbol".into()),
        SymbolFallback::Diagnostic => warnings.push("payload replaced by diagnostic text".into()),
    }

    tracing::debug!(
        "rendered v{} {} symbol: {} modules at {} px ({:.3} mm)",
        metrics.version,
        metrics.ecc,
        total_modules,
        module_px,
        module_mm
    );

    Ok(RenderedQr {
        image,
        payload: symbol.payload,
        metrics,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Field;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_physical_size_matches_target() {
        let options = RenderOptions {
            inches: 1.5,
            dpi: 300,
            ..Default::default()
        };
        let rendered = render_physical("LOTE: ABC123", &options).unwrap();
        assert_eq!(rendered.image.width(), 450);
        assert_eq!(rendered.image.height(), 450);

        let m = &rendered.metrics;
        assert_eq!(m.total_modules, m.symbol_modules + 8);
        assert_eq!(m.module_px, 450 / m.total_modules);
        let expected_mm = (450 / m.total_modules) as f32 * 25.4 / 300.0;
        assert!((m.module_mm - expected_mm).abs() < 1e-4);
        assert!(m.is_legible());
        assert!(rendered.warnings.is_empty());
    }

    #[test]
    fn test_raster_is_centred_with_white_margin() {
        let rendered = render_physical("LOTE: ABC123", &RenderOptions::default()).unwrap();
        let m = &rendered.metrics;
        let drawn = m.total_modules * m.module_px;
        let offset = (450 - drawn) / 2;
        // First finder pattern module sits just inside the quiet zone.
        let finder = offset + options_border_px(m);
        assert_eq!(*rendered.image.get_pixel(finder, finder), Rgb([0, 0, 0]));
        assert_eq!(*rendered.image.get_pixel(0, 0), WHITE);
    }

    fn options_border_px(m: &QrMetrics) -> u32 {
        DEFAULT_BORDER_MODULES * m.module_px
    }

    #[test]
    fn test_small_print_warns_about_legibility() {
        let payload = "MEDICAMENTO: CLONAZEPAM 2 mg ".repeat(20);
        let options = RenderOptions {
            inches: 0.5,
            dpi: 200,
            ..Default::default()
        };
        let rendered = render_physical(&payload, &options).unwrap();
        assert!(!rendered.metrics.is_legible());
        assert!(rendered.warnings.iter().any(|w| w.contains("below 0.33 mm")));
    }

    #[test]
    fn test_logo_forces_high_correction() {
        let logo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255])));
        let options = RenderOptions {
            logo: Some(logo),
            ..Default::default()
        };
        let rendered = render_physical("LOTE: ABC123", &options).unwrap();
        assert_eq!(rendered.metrics.ecc, EccLevel::H);
        let centre = rendered.image.get_pixel(225, 225);
        assert!(centre[2] > 200 && centre[0] < 50);
    }

    #[test]
    fn test_invalid_size_rejected() {
        let options = RenderOptions {
            dpi: 0,
            ..Default::default()
        };
        assert!(matches!(
            render_physical("x", &options),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_fill_color_resolution() {
        let narcotic = MedicationRecord::new().with(Field::Control, "Estupefaciente");
        assert_eq!(FillColor::Auto.resolve(&narcotic), Rgb([0xff, 0xcc, 0x00]));
        assert_eq!(FillColor::Auto.resolve(&MedicationRecord::new()), Rgb([0x00, 0xa8, 0x59]));
        assert_eq!("#102030".parse::<FillColor>().unwrap(), FillColor::Custom([0x10, 0x20, 0x30]));
        assert_eq!("black".parse::<FillColor>().unwrap(), FillColor::Black);
        assert!("#12".parse::<FillColor>().is_err());
    }
}
