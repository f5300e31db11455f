//! Terminal QR preview.

use medqr_core::EccLevel;
use qrcode::QrCode;

/// Print a QR code to the terminal.
///
/// Uses Unicode block characters for compact display where
/// each character represents 2 vertical modules.
pub fn print_qr_code(data: &str, ecc: EccLevel) {
    let code = match QrCode::with_error_correction_level(data.as_bytes(), ecc.to_qrcode()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to draw preview: {}", e);
            return;
        }
    };

    let colors = code.to_colors();
    let width = code.width();
    let dark = |i: usize| colors.get(i).map(|c| *c == qrcode::Color::Dark).unwrap_or(false);

    let quiet = "  ";

    // Top quiet zone
    println!("{}{}", quiet, " ".repeat(width + 4));

    for y in (0..colors.len()).step_by(width * 2) {
        let row: String = (0..width)
            .map(|x| match (dark(y + x), dark(y + width + x)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            })
            .collect();
        println!("{}  {}  ", quiet, row);
    }

    // Bottom quiet zone
    println!("{}{}", quiet, " ".repeat(width + 4));
}
