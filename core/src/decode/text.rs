//! Delimited-text decoder

use crate::decode::{ParseOutcome, RecordBuilder};

fn is_section_header(line: &str) -> bool {
    line.starts_with("===") && line.ends_with("===")
}

/// Parse `LABEL: value` lines; headers are skipped, other unlabeled lines reported
pub(crate) fn parse_text(raw: &str) -> ParseOutcome {
    let mut builder = RecordBuilder::default();

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.split_once(':') {
            Some((label, value)) => builder.labeled(label, value),
            None if is_section_header(line) => {}
            None => builder.warn(format!("unlabeled line '{}'", line)),
        }
    }

    builder.finish()
}
