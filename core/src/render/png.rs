//! PNG output with print resolution metadata

use png::{BitDepth, ColorType, Encoder, PixelDimensions, Unit};

use image::RgbImage;

use crate::render::MM_PER_INCH;
use crate::Result;

/// `dpi` as pixels per metre, the only physical unit PNG knows
fn pixels_per_metre(dpi: u32) -> u32 {
    (dpi as f64 * 1000.0 / MM_PER_INCH as f64).round() as u32
}

/// Encode an image as PNG, embedding `dpi` in a `pHYs` chunk when given
pub fn encode_png(image: &RgbImage, dpi: Option<u32>) -> Result<Vec<u8>> {
    let mut png = Vec::new();

    let mut encoder = Encoder::new(&mut png, image.width(), image.height());
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Eight);
    if let Some(dpi) = dpi.filter(|d| *d > 0) {
        let ppm = pixels_per_metre(dpi);
        encoder.set_pixel_dims(Some(PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: Unit::Meter,
        }));
    }

    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())?;
    writer.finish()?;

    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Cursor;

    fn pixel_dims(png: &[u8]) -> Option<PixelDimensions> {
        let reader = png::Decoder::new(Cursor::new(png)).read_info().unwrap();
        reader.info().pixel_dims
    }

    #[test]
    fn test_pixels_per_metre() {
        assert_eq!(pixels_per_metre(300), 11811);
        assert_eq!(pixels_per_metre(600), 23622);
    }

    #[test]
    fn test_png_with_dpi_still_decodes() {
        let img = RgbImage::from_pixel(30, 30, Rgb([255, 255, 255]));
        let png = encode_png(&img, Some(300)).unwrap();

        let dims = pixel_dims(&png).unwrap();
        assert_eq!(dims.xppu, 11811);
        assert_eq!(dims.yppu, 11811);
        assert_eq!(dims.unit, Unit::Meter);

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 30);
        assert_eq!(decoded.height(), 30);
        assert_eq!(decoded.to_rgb8(), img);
    }

    #[test]
    fn test_png_without_dpi() {
        let img = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let png = encode_png(&img, None).unwrap();
        assert!(pixel_dims(&png).is_none());
        assert!(encode_png(&img, Some(0)).map(|p| pixel_dims(&p).is_none()).unwrap());
    }
}
