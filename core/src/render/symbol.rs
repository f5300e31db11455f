//! Symbol construction with error-correction fallback

use qrcode::types::QrError;
use qrcode::{QrCode, Version};

use crate::ecc::EccLevel;
use crate::payload::constants::{DIAGNOSTIC_PAYLOAD, EMERGENCY_PREFIX_CHARS};
use crate::{Error, Result};

/// How far symbol construction had to degrade the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolFallback {
    /// The payload was encoded as given
    None,
    /// A truncated `MEDICAMENTO: ...` prefix was encoded at level L
    Truncated,
    /// Only the fixed diagnostic text could be encoded
    Diagnostic,
}

/// A built QR symbol and the text it actually carries
pub struct Symbol {
    pub code: QrCode,
    pub ecc: EccLevel,
    pub payload: String,
    pub fallback: SymbolFallback,
}

impl Symbol {
    /// Modules per side, quiet zone excluded
    pub fn width(&self) -> u32 {
        self.code.width() as u32
    }

    pub fn version(&self) -> i16 {
        match self.code.version() {
            Version::Normal(v) | Version::Micro(v) => v,
        }
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Symbol")
            .field("version", &self.version())
            .field("width", &self.width())
            .field("ecc", &self.ecc)
            .field("fallback", &self.fallback)
            .finish()
    }
}

fn try_encode(payload: &str, ecc: EccLevel) -> std::result::Result<QrCode, QrError> {
    QrCode::with_error_correction_level(payload.as_bytes(), ecc.to_qrcode())
}

fn truncated_payload(payload: &str) -> String {
    if payload.chars().count() > EMERGENCY_PREFIX_CHARS {
        let prefix: String = payload.chars().take(EMERGENCY_PREFIX_CHARS).collect();
        format!("MEDICAMENTO: {}...", prefix)
    } else {
        payload.to_string()
    }
}

/// Build a symbol at `requested`, retrying at each weaker level
///
/// A level is skipped when the payload exceeds its byte cap or the QR
/// library rejects it as too long. When every level fails the payload is
/// truncated, and as a last resort a fixed diagnostic string is encoded.
pub fn build_symbol(payload: &str, requested: EccLevel) -> Result<Symbol> {
    for ecc in requested.fallback_chain() {
        if payload.len() > ecc.cap_bytes() {
            tracing::debug!("{} byte payload exceeds cap at {}", payload.len(), ecc);
            continue;
        }
        match try_encode(payload, ecc) {
            Ok(code) => {
                if ecc != requested {
                    tracing::warn!("QR symbol built at {} instead of {}", ecc, requested);
                }
                return Ok(Symbol {
                    code,
                    ecc,
                    payload: payload.to_string(),
                    fallback: SymbolFallback::None,
                });
            }
            Err(e) => tracing::debug!("QR encode at {} failed: {}", ecc, e),
        }
    }

    let basic = truncated_payload(payload);
    if let Ok(code) = try_encode(&basic, EccLevel::L) {
        tracing::warn!("payload too large for any level, encoded truncated prefix");
        return Ok(Symbol {
            code,
            ecc: EccLevel::L,
            payload: basic,
            fallback: SymbolFallback::Truncated,
        });
    }

    tracing::warn!("truncated payload rejected, encoding diagnostic text");
    let code = try_encode(DIAGNOSTIC_PAYLOAD, EccLevel::L)
        .map_err(|e| Error::Qr(e.to_string()))?;
    Ok(Symbol {
        code,
        ecc: EccLevel::L,
        payload: DIAGNOSTIC_PAYLOAD.to_string(),
        fallback: SymbolFallback::Diagnostic,
    })
}
