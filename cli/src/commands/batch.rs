//! Batch command implementation.

use std::fs::File;
use std::io::BufWriter;

use anyhow::Context;
use medqr_core::{run_batch, Config};

use crate::args::BatchArgs;

/// Encode a CSV file into a zip archive plus manifest.
pub fn batch(args: BatchArgs, config: &Config) -> anyhow::Result<()> {
    let options = args.render.to_options()?;
    let manifest_path = args
        .manifest
        .clone()
        .unwrap_or_else(|| args.output.with_extension("csv"));

    let input = File::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?;
    let archive = File::create(&args.output).with_context(|| format!("creating {}", args.output.display()))?;
    let manifest = File::create(&manifest_path)
        .with_context(|| format!("creating {}", manifest_path.display()))?;

    let report = run_batch(
        input,
        &options,
        &config.defaults,
        BufWriter::new(archive),
        BufWriter::new(manifest),
    )?;

    println!(
        "\x1b[1;32m✓\x1b[0m {} QR(s) written to \x1b[1m{}\x1b[0m ({:?} template)",
        report.encoded.len(),
        args.output.display(),
        report.schema
    );
    println!("  Manifest: {}", manifest_path.display());

    if !report.failures.is_empty() {
        println!("\x1b[1;33m⚠\x1b[0m {} row(s) skipped:", report.failures.len());
        for failure in &report.failures {
            let name = if failure.name.is_empty() { "(no name)" } else { failure.name.as_str() };
            println!("  row {}: {}: {}", failure.row, name, failure.reason);
        }
    }

    if report.encoded.is_empty() {
        anyhow::bail!("no QR codes could be generated");
    }
    Ok(())
}
