//! Capacity-aware payload selection
//!
//! QR capacity shrinks as error correction grows, so the requested format
//! is tried first and smaller formats follow until one fits the byte
//! budget of the chosen level. Selection never fails.

use crate::ecc::EccLevel;
use crate::payload::constants::EMERGENCY_PREFIX_CHARS;
use crate::payload::{encode_as, text::build_text_payload, PayloadFormat};
use crate::record::MedicationRecord;

/// Outcome of payload selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub payload: String,
    pub format: PayloadFormat,
    pub requested: PayloadFormat,
}

impl Selection {
    /// True when a smaller format replaced the requested one
    pub fn fell_back(&self) -> bool {
        self.format != self.requested
    }

    pub fn byte_len(&self) -> usize {
        self.payload.len()
    }
}

/// Formats tried, in order, for a requested format
pub fn fallback_chain(requested: PayloadFormat) -> &'static [PayloadFormat] {
    use PayloadFormat::*;
    match requested {
        HtmlTable => &[HtmlTable, HtmlTableBase64, Text, TextCompact],
        HtmlTableBase64 => &[HtmlTableBase64, Text, TextCompact],
        Json => &[Json, Text, TextCompact],
        Text => &[Text, TextCompact],
        TextCompact => &[TextCompact],
        ExternalUrl => &[ExternalUrl, Text, TextCompact],
        Emergency => &[],
    }
}

/// Single-line truncated payload used when nothing else fits
pub fn emergency_payload(record: &MedicationRecord) -> String {
    let line = build_text_payload(record, true)
        .lines()
        .collect::<Vec<_>>()
        .join(" | ");
    let truncated: String = line.chars().take(EMERGENCY_PREFIX_CHARS).collect();
    if truncated.len() < line.len() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// Pick the first format in the fallback chain whose payload fits `ecc`'s cap
pub fn select_payload(
    record: &MedicationRecord,
    requested: PayloadFormat,
    ecc: EccLevel,
) -> Selection {
    let cap = ecc.cap_bytes();

    for &format in fallback_chain(requested) {
        let payload = match encode_as(record, format) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("{} payload could not be built: {}", format, e);
                continue;
            }
        };
        if payload.is_empty() && format == PayloadFormat::ExternalUrl {
            tracing::debug!("no URL on record, skipping external-url format");
            continue;
        }
        if payload.len() <= cap {
            if format != requested {
                tracing::warn!(
                    "{} payload exceeds {} byte cap at {}, using {}",
                    requested,
                    cap,
                    ecc,
                    format
                );
            }
            return Selection { payload, format, requested };
        }
        tracing::debug!("{} payload is {} bytes, cap {}", format, payload.len(), cap);
    }

    tracing::warn!("no format fits {} byte cap at {}, using emergency payload", cap, ecc);
    Selection {
        payload: emergency_payload(record),
        format: PayloadFormat::Emergency,
        requested,
    }
}
