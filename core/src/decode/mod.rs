//! Scan decoding: sniff the payload format and parse it back into a record
//!
//! Scanners in keyboard-wedge mode hand over raw text with no format tag.
//! The format is inferred from the leading bytes, parsed with
//! format-specific rules, and every label goes through the alias table.
//! Decoding never panics and never returns an error: malformed input
//! becomes a [`ParseOutcome::Failed`] or [`ParseOutcome::Partial`].

mod html;
mod json;
mod text;

use serde::Serialize;

use crate::normalize::{assign, resolve, settle, SplitRule, Target};
use crate::payload::constants::{HTML_DATA_URI_BASE64, HTML_DATA_URI_PREFIX};
use crate::payload::PayloadFormat;
use crate::record::{Field, MedicationRecord};

/// Coarse result of a decode, as written to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Parsed,
    Partial,
    Failed,
}

impl ScanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanStatus::Parsed => "parsed",
            ScanStatus::Partial => "partial",
            ScanStatus::Failed => "failed",
        }
    }
}

/// Result of decoding one scan
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Fields were recognized and nothing was dropped
    Parsed(MedicationRecord),
    /// Some fields were recognized, some input was dropped
    Partial {
        record: MedicationRecord,
        warnings: Vec<String>,
    },
    /// Nothing usable was recognized
    Failed { reason: String },
}

impl ParseOutcome {
    pub fn status(&self) -> ScanStatus {
        match self {
            ParseOutcome::Parsed(_) => ScanStatus::Parsed,
            ParseOutcome::Partial { .. } => ScanStatus::Partial,
            ParseOutcome::Failed { .. } => ScanStatus::Failed,
        }
    }

    pub fn record(&self) -> Option<&MedicationRecord> {
        match self {
            ParseOutcome::Parsed(record) | ParseOutcome::Partial { record, .. } => Some(record),
            ParseOutcome::Failed { .. } => None,
        }
    }

    /// The parsed record; empty when decoding failed
    pub fn into_record(self) -> MedicationRecord {
        match self {
            ParseOutcome::Parsed(record) | ParseOutcome::Partial { record, .. } => record,
            ParseOutcome::Failed { .. } => MedicationRecord::default(),
        }
    }

    /// Warnings, or the failure reason
    pub fn messages(&self) -> Vec<String> {
        match self {
            ParseOutcome::Parsed(_) => Vec::new(),
            ParseOutcome::Partial { warnings, .. } => warnings.clone(),
            ParseOutcome::Failed { reason } => vec![reason.clone()],
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        ParseOutcome::Failed { reason: reason.into() }
    }
}

/// Accumulates recognized fields and dropped input while parsing
#[derive(Debug, Default)]
pub(crate) struct RecordBuilder {
    record: MedicationRecord,
    warnings: Vec<String>,
    deferred: Vec<SplitRule>,
}

impl RecordBuilder {
    /// Assign a labeled value through the alias table
    pub(crate) fn labeled(&mut self, label: &str, value: &str) {
        match resolve(label) {
            Some(target) => {
                if let Target::SplitIfAlone(rule) = target {
                    self.deferred.push(rule);
                }
                assign(&mut self.record, target, value);
            }
            None => self.warn(format!("unrecognized label '{}'", label.trim())),
        }
    }

    pub(crate) fn set(&mut self, field: Field, value: &str) {
        self.record.set(field, value);
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub(crate) fn finish(mut self) -> ParseOutcome {
        for rule in self.deferred.drain(..) {
            settle(&mut self.record, rule);
        }
        if self.record.is_empty() {
            let reason = if self.warnings.is_empty() {
                "no recognized fields".to_string()
            } else {
                format!("no recognized fields ({})", self.warnings.join("; "))
            };
            ParseOutcome::Failed { reason }
        } else if self.warnings.is_empty() {
            ParseOutcome::Parsed(self.record)
        } else {
            ParseOutcome::Partial {
                record: self.record,
                warnings: self.warnings,
            }
        }
    }
}

/// Infer the payload format from its leading bytes
pub fn sniff(raw: &str) -> PayloadFormat {
    let raw = raw.trim_start();
    if raw.starts_with(HTML_DATA_URI_BASE64) {
        PayloadFormat::HtmlTableBase64
    } else if raw.starts_with(HTML_DATA_URI_PREFIX) {
        PayloadFormat::HtmlTable
    } else if raw.starts_with('{') {
        PayloadFormat::Json
    } else if raw.starts_with("http://") || raw.starts_with("https://") {
        PayloadFormat::ExternalUrl
    } else {
        PayloadFormat::Text
    }
}

/// Decode raw scanned text of unknown format
pub fn decode_scan(raw: &str) -> ParseOutcome {
    let raw = raw.trim();
    if raw.is_empty() {
        return ParseOutcome::failed("empty scan");
    }

    let format = sniff(raw);
    tracing::debug!("decoding {} byte scan as {}", raw.len(), format);

    match format {
        PayloadFormat::HtmlTable | PayloadFormat::HtmlTableBase64 => html::parse_data_uri(raw),
        PayloadFormat::Json => json::parse_json(raw),
        PayloadFormat::ExternalUrl => {
            let mut builder = RecordBuilder::default();
            builder.set(Field::Url, raw);
            builder.warn("external URL; record fields are not embedded in the code");
            builder.finish()
        }
        _ => text::parse_text(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{encode_as, PayloadFormat};
    use crate::record::sample_record;
    use proptest::prelude::*;

    /// Fields both the text and JSON payloads carry, besides name and concentration
    const CARRIED: [Field; 15] = [
        Field::Form,
        Field::Presentation,
        Field::Control,
        Field::SanitaryRegistration,
        Field::ProductCode,
        Field::Batch,
        Field::ManufactureDate,
        Field::ExpiryDate,
        Field::Manufacturer,
        Field::Importer,
        Field::RepackagingEntity,
        Field::RepackagingDate,
        Field::Storage,
        Field::Warnings,
        Field::RegulatoryCitation,
    ];

    // Names may lead with a digit; later words start with a letter.
    const NAME: &str = "([1-9]-?)?[A-Z]{2,8}( {1,2}[A-Z][A-Z0-9]{0,6}){0,2}";
    const CONCENTRATION: &str = "[1-9][0-9]{0,3}(,[0-9])?( {1,2})(mg|mcg|g|UI)(/[1-9]? ?mL)?";
    const VALUE: &str = "[A-Za-z0-9][A-Za-z0-9./()-]{0,8}([ \t]{1,2}[A-Za-z0-9./()-]{1,8}){0,3}";

    fn arb_record() -> impl Strategy<Value = MedicationRecord> {
        (
            NAME,
            CONCENTRATION,
            proptest::collection::vec(proptest::option::of(VALUE), CARRIED.len()),
        )
            .prop_map(|(name, concentration, rest)| {
                let mut record = MedicationRecord::new()
                    .with(Field::Name, name)
                    .with(Field::Concentration, concentration);
                for (field, value) in CARRIED.iter().zip(rest) {
                    if let Some(value) = value {
                        record.set(*field, value);
                    }
                }
                record
            })
    }

    proptest! {
        #[test]
        fn text_payload_round_trips(record in arb_record()) {
            let payload = encode_as(&record, PayloadFormat::Text).unwrap();
            prop_assert_eq!(decode_scan(&payload), ParseOutcome::Parsed(record));
        }

        #[test]
        fn json_payload_round_trips(record in arb_record()) {
            let payload = encode_as(&record, PayloadFormat::Json).unwrap();
            prop_assert_eq!(decode_scan(&payload), ParseOutcome::Parsed(record));
        }
    }

    #[test]
    fn test_sniff() {
        assert_eq!(sniff("data:text/html,%3C"), PayloadFormat::HtmlTable);
        assert_eq!(sniff("data:text/html;base64,PCF"), PayloadFormat::HtmlTableBase64);
        assert_eq!(sniff("  {\"v\":1}"), PayloadFormat::Json);
        assert_eq!(sniff("https://example.com/x"), PayloadFormat::ExternalUrl);
        assert_eq!(sniff("LOTE: ABC123"), PayloadFormat::Text);
    }

    #[test]
    fn test_text_roundtrip() {
        let record = sample_record();
        let payload = encode_as(&record, PayloadFormat::Text).unwrap();
        assert_eq!(decode_scan(&payload), ParseOutcome::Parsed(record));
    }

    #[test]
    fn test_text_roundtrip_with_product_code() {
        let record = sample_record().with(Field::ProductCode, "7701234567890");
        let payload = encode_as(&record, PayloadFormat::Text).unwrap();
        assert_eq!(decode_scan(&payload).into_record(), record);
    }

    #[test]
    fn test_text_roundtrip_name_leading_digit() {
        let record = MedicationRecord::new()
            .with(Field::Name, "5-FLUOROURACILO")
            .with(Field::Concentration, "500 mg")
            .with(Field::Batch, "L1");
        let payload = encode_as(&record, PayloadFormat::Text).unwrap();
        assert!(payload.contains("MEDICAMENTO: 5-FLUOROURACILO 500 mg"));
        assert_eq!(decode_scan(&payload), ParseOutcome::Parsed(record));
    }

    #[test]
    fn test_text_roundtrip_keeps_inner_whitespace() {
        let record = sample_record()
            .with(Field::Storage, "Conservar  en lugar fresco")
            .with(Field::Warnings, "No\tagitar");
        let payload = encode_as(&record, PayloadFormat::Text).unwrap();
        assert_eq!(decode_scan(&payload), ParseOutcome::Parsed(record));
    }

    #[test]
    fn test_forma_line_with_presentation_line() {
        let record = decode_scan("FORMA: Tableta-recubierta\nPRESENTACIÓN: Caja").into_record();
        assert_eq!(record.form, "Tableta-recubierta");
        assert_eq!(record.presentation, "Caja");

        let record = decode_scan("PRESENTACIÓN: Caja\nFORMA: Tableta-recubierta").into_record();
        assert_eq!(record.form, "Tableta-recubierta");
        assert_eq!(record.presentation, "Caja");
    }

    #[test]
    fn test_json_roundtrip() {
        let record = sample_record().with(Field::ProductCode, "PC-9");
        let payload = encode_as(&record, PayloadFormat::Json).unwrap();
        assert_eq!(decode_scan(&payload), ParseOutcome::Parsed(record));
    }

    #[test]
    fn test_html_roundtrip_both_framings() {
        let record = sample_record();
        for format in [PayloadFormat::HtmlTable, PayloadFormat::HtmlTableBase64] {
            let payload = encode_as(&record, format).unwrap();
            assert_eq!(decode_scan(&payload), ParseOutcome::Parsed(record.clone()));
        }
    }

    #[test]
    fn test_compact_text_recovers_priority_fields() {
        let record = sample_record();
        let payload = encode_as(&record, PayloadFormat::TextCompact).unwrap();
        let decoded = decode_scan(&payload).into_record();
        assert_eq!(decoded.name, "CLONAZEPAM");
        assert_eq!(decoded.concentration, "2 mg");
        assert_eq!(decoded.form, "Tableta");
        assert_eq!(decoded.presentation, "Blíster x10");
        assert_eq!(decoded.sanitary_registration, record.sanitary_registration);
        assert_eq!(decoded.expiry_date, "12/2025");
        assert_eq!(decoded.importer, "");
    }

    #[test]
    fn test_clonazepam_text_scenario() {
        let record = MedicationRecord::new()
            .with(Field::Name, "CLONAZEPAM")
            .with(Field::Concentration, "2 mg")
            .with(Field::Batch, "ABC123")
            .with(Field::ExpiryDate, "12/2025");
        let payload = encode_as(&record, PayloadFormat::Text).unwrap();
        assert!(payload.contains("MEDICAMENTO: CLONAZEPAM 2 mg"));

        let decoded = decode_scan(&payload).into_record();
        assert_eq!(decoded.name, "CLONAZEPAM");
        assert_eq!(decoded.concentration, "2 mg");
        assert_eq!(decoded.batch, "ABC123");
        assert_eq!(decoded.expiry_date, "12/2025");
    }

    #[test]
    fn test_url_scan() {
        let outcome = decode_scan("https://example.com/med/123");
        assert_eq!(outcome.status(), ScanStatus::Partial);
        assert_eq!(outcome.into_record().url, "https://example.com/med/123");
    }

    #[test]
    fn test_empty_and_garbage_scans_fail() {
        assert_eq!(decode_scan("   ").status(), ScanStatus::Failed);
        assert_eq!(decode_scan("no labels here").status(), ScanStatus::Failed);
        assert_eq!(decode_scan("{not json").status(), ScanStatus::Failed);
        assert!(decode_scan("{not json").into_record().is_empty());
    }

    #[test]
    fn test_unknown_labels_make_partial() {
        let outcome = decode_scan("LOTE: ABC123\nCOLOR: azul");
        match outcome {
            ParseOutcome::Partial { record, warnings } => {
                assert_eq!(record.batch, "ABC123");
                assert_eq!(warnings, vec!["unrecognized label 'COLOR'".to_string()]);
            }
            other => panic!("expected partial, got {:?}", other),
        }
    }
}
