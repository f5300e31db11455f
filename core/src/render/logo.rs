//! Centre logo composition

use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage, Rgba};
use std::path::Path;

use crate::Result;

pub const DEFAULT_LOGO_PERCENT: u32 = 20;
pub const MIN_LOGO_PERCENT: u32 = 5;
pub const MAX_LOGO_PERCENT: u32 = 30;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Is (x, y) inside a `side`-wide square with corners rounded by `radius`?
fn inside_rounded_square(x: u32, y: u32, side: u32, radius: u32) -> bool {
    let (x, y, side, r) = (x as i64, y as i64, side as i64, radius as i64);
    let cx = if x < r { r } else if x >= side - r { side - r - 1 } else { x };
    let cy = if y < r { r } else if y >= side - r { side - r - 1 } else { y };
    let (dx, dy) = (x - cx, y - cy);
    dx * dx + dy * dy <= r * r
}

fn blend(bg: &Rgb<u8>, fg: &Rgba<u8>) -> Rgb<u8> {
    let alpha = fg[3] as f32 / 255.0;
    let inv = 1.0 - alpha;
    Rgb([
        (fg[0] as f32 * alpha + bg[0] as f32 * inv) as u8,
        (fg[1] as f32 * alpha + bg[1] as f32 * inv) as u8,
        (fg[2] as f32 * alpha + bg[2] as f32 * inv) as u8,
    ])
}

/// Paste `logo` at the centre of `canvas` on a white rounded pad
///
/// The logo's longer side is `percent` of `qr_side` (clamped to 5-30 %),
/// aspect ratio preserved; the pad adds a margin of an eighth of that.
pub fn composite_logo(canvas: &mut RgbImage, logo: &DynamicImage, qr_side: u32, percent: u32) {
    let percent = percent.clamp(MIN_LOGO_PERCENT, MAX_LOGO_PERCENT);
    let logo_side = (qr_side * percent / 100).max(1);
    let margin = (logo_side / 8).max(1);
    let pad_side = logo_side + 2 * margin;
    let radius = pad_side / 5;

    let pad_x = canvas.width().saturating_sub(pad_side) / 2;
    let pad_y = canvas.height().saturating_sub(pad_side) / 2;
    for dy in 0..pad_side {
        for dx in 0..pad_side {
            let (x, y) = (pad_x + dx, pad_y + dy);
            if x < canvas.width() && y < canvas.height() && inside_rounded_square(dx, dy, pad_side, radius) {
                canvas.put_pixel(x, y, WHITE);
            }
        }
    }

    let scaled = logo.resize(logo_side, logo_side, FilterType::Lanczos3).to_rgba8();
    let logo_x = canvas.width().saturating_sub(scaled.width()) / 2;
    let logo_y = canvas.height().saturating_sub(scaled.height()) / 2;
    for (dx, dy, pixel) in scaled.enumerate_pixels() {
        let (x, y) = (logo_x + dx, logo_y + dy);
        if x < canvas.width() && y < canvas.height() && pixel[3] > 0 {
            let blended = blend(canvas.get_pixel(x, y), pixel);
            canvas.put_pixel(x, y, blended);
        }
    }
}

/// Read a logo from disk in any format the `image` crate was built with
pub fn load_logo(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let logo = image::open(path.as_ref())?;
    tracing::debug!("loaded logo {} ({}x{})", path.as_ref().display(), logo.width(), logo.height());
    Ok(logo)
}
