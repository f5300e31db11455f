//! Decode command implementation.

use std::io::Read;

use medqr_core::{ScanEvent, ScanStatus};

use crate::ui::{print_record, print_warnings};

/// Decode one payload from the argument or stdin.
pub fn decode(payload: Option<String>, json: bool) -> anyhow::Result<()> {
    let raw = match payload {
        Some(p) => p,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let event = ScanEvent::capture(&raw);

    if json {
        println!("{}", serde_json::to_string_pretty(&event)?);
        return Ok(());
    }

    let badge = match event.status {
        ScanStatus::Parsed => "\x1b[1;32m✓\x1b[0m",
        ScanStatus::Partial => "\x1b[1;33m◐\x1b[0m",
        ScanStatus::Failed => "\x1b[1;31m✗\x1b[0m",
    };
    println!("{} {}", badge, event.status.as_str());
    print_record(&event.record);
    print_warnings(&event.warnings);
    Ok(())
}
