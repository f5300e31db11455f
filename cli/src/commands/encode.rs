//! Encode command implementation.

use std::path::PathBuf;

use anyhow::Context;
use medqr_core::normalize::normalize_key;
use medqr_core::{encode_record, Config};

use crate::args::EncodeArgs;
use crate::ui::{print_qr_code, print_warnings};

/// Encode one record and write the PNG.
pub fn encode(args: EncodeArgs, config: &Config) -> anyhow::Result<()> {
    let mut record = args.record.to_record()?;
    record.apply_defaults(&config.defaults);
    let options = args.render.to_options()?;

    let encoded = encode_record(&record, &options)?;
    let metrics = &encoded.rendered.metrics;

    let output = args.output.unwrap_or_else(|| {
        let slug = normalize_key(&record.name);
        PathBuf::from(format!("qr_{}.png", if slug.is_empty() { "med" } else { slug.as_str() }))
    });
    std::fs::write(&output, &encoded.png).with_context(|| format!("writing {}", output.display()))?;

    println!("\x1b[1;32m✓\x1b[0m Wrote \x1b[1m{}\x1b[0m", output.display());
    println!("  \x1b[1mPayload:\x1b[0m {} ({} bytes)", encoded.selection.format, encoded.selection.byte_len());
    println!("  \x1b[1mSymbol:\x1b[0m  version {}, ECC {}", metrics.version, metrics.ecc);
    println!(
        "  \x1b[1mSize:\x1b[0m    {} px, {} modules at {} px ({:.3} mm)",
        metrics.side_px, metrics.total_modules, metrics.module_px, metrics.module_mm
    );
    print_warnings(&encoded.warnings());

    if args.preview {
        println!();
        print_qr_code(&encoded.rendered.payload, metrics.ecc);
    }

    Ok(())
}
