//! Payload encoders: record -> scan text
//!
//! The payload text is the only contract between the label generator and
//! the scan logger. Label strings and JSON keys produced here must stay
//! resolvable by the alias table in `normalize`.

pub mod constants;
mod html;
mod json;
mod select;
mod text;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::MedicationRecord;
use crate::{Error, Result};

pub use html::{build_html_payload, escape_html, html_document, html_rows};
pub use json::build_json_payload;
pub use select::{emergency_payload, fallback_chain, select_payload, Selection};
pub use text::build_text_payload;

/// How a record was serialized into scan text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadFormat {
    /// Labeled `FIELD: value` lines with section headers
    Text,
    /// The seven priority lines, no headers
    TextCompact,
    Json,
    /// Percent-encoded `data:text/html,` page
    HtmlTable,
    /// `data:text/html;base64,` page
    HtmlTableBase64,
    /// Caller-supplied hosted URL
    ExternalUrl,
    /// Truncated single line chosen when nothing else fits
    Emergency,
}

impl PayloadFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadFormat::Text => "text",
            PayloadFormat::TextCompact => "text-compact",
            PayloadFormat::Json => "json",
            PayloadFormat::HtmlTable => "html-table",
            PayloadFormat::HtmlTableBase64 => "html-table-base64",
            PayloadFormat::ExternalUrl => "external-url",
            PayloadFormat::Emergency => "emergency",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(PayloadFormat::Text),
            "text-compact" | "compact" => Ok(PayloadFormat::TextCompact),
            "json" => Ok(PayloadFormat::Json),
            "html" | "html-table" => Ok(PayloadFormat::HtmlTable),
            "html-base64" | "html-table-base64" => Ok(PayloadFormat::HtmlTableBase64),
            "url" | "external-url" => Ok(PayloadFormat::ExternalUrl),
            other => Err(Error::InvalidInput(format!("unknown payload format: {}", other))),
        }
    }
}

/// Encode a record in exactly the given format, without capacity checks
///
/// `ExternalUrl` yields the record's URL verbatim, which may be empty.
pub fn encode_as(record: &MedicationRecord, format: PayloadFormat) -> Result<String> {
    Ok(match format {
        PayloadFormat::Text => build_text_payload(record, false),
        PayloadFormat::TextCompact => build_text_payload(record, true),
        PayloadFormat::Json => build_json_payload(record)?,
        PayloadFormat::HtmlTable => build_html_payload(record, false),
        PayloadFormat::HtmlTableBase64 => build_html_payload(record, true),
        PayloadFormat::ExternalUrl => record.url.trim().to_string(),
        PayloadFormat::Emergency => emergency_payload(record),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample_record;

    #[test]
    fn test_format_parse_roundtrip() {
        for format in [
            PayloadFormat::Text,
            PayloadFormat::TextCompact,
            PayloadFormat::Json,
            PayloadFormat::HtmlTable,
            PayloadFormat::HtmlTableBase64,
            PayloadFormat::ExternalUrl,
        ] {
            assert_eq!(format.as_str().parse::<PayloadFormat>().unwrap(), format);
        }
        assert!("emergency".parse::<PayloadFormat>().is_err());
    }

    #[test]
    fn test_capacity_monotonicity() {
        let record = sample_record();
        let compact = encode_as(&record, PayloadFormat::TextCompact).unwrap().len();
        let text = encode_as(&record, PayloadFormat::Text).unwrap().len();
        let html = encode_as(&record, PayloadFormat::HtmlTable).unwrap().len();
        assert!(compact <= text, "compact {} > text {}", compact, text);
        assert!(text <= html, "text {} > html {}", text, html);
    }
}
