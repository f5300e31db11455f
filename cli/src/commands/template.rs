//! Template command implementation.

use std::path::PathBuf;

use anyhow::Context;
use medqr_core::TemplateSchema;

/// Print or save the CSV template for `schema`.
pub fn template(schema: TemplateSchema, output: Option<PathBuf>) -> anyhow::Result<()> {
    let csv = schema.template_csv()?;
    match output {
        Some(path) => {
            std::fs::write(&path, csv).with_context(|| format!("writing {}", path.display()))?;
            println!("\x1b[1;32m✓\x1b[0m Template written to {}", path.display());
        }
        None => print!("{}", csv),
    }
    Ok(())
}
