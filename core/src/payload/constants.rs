//! Payload wire constants
//!
//! Labels, prefixes and byte budgets shared by the encoders and the
//! scan decoder. A change here changes what scanners in the field read.

/// Prefix shared by both HTML data-URI framings
pub const HTML_DATA_URI_PREFIX: &str = "data:text/html";

/// Percent-encoded HTML framing
pub const HTML_DATA_URI_PLAIN: &str = "data:text/html,";

/// Base64 HTML framing
pub const HTML_DATA_URI_BASE64: &str = "data:text/html;base64,";

/// Byte budgets per error-correction level
pub const CAP_BYTES_L: usize = 2800;
pub const CAP_BYTES_M: usize = 2200;
pub const CAP_BYTES_Q: usize = 1850;
pub const CAP_BYTES_H: usize = 1250;

/// Characters of payload kept by the truncated emergency payloads
pub const EMERGENCY_PREFIX_CHARS: usize = 100;

/// Encoded when even the truncated payload cannot be made into a symbol
pub const DIAGNOSTIC_PAYLOAD: &str = "Error: Información muy extensa para QR";

/// Citation filled into records that do not carry one
pub const DEFAULT_CITATION: &str = "Res 1478/2006 - Circ 01/2016 FNE";

/// Separator between entries of the JSON `normativa` array when flattened
pub const CITATION_SEPARATOR: &str = "; ";

/// Version tag of the JSON payload
pub const JSON_PAYLOAD_VERSION: u8 = 1;

/// Header band text of the HTML payload
pub const HTML_HEADER_TEXT: &str = "MEDICAMENTO DE CONTROL ESPECIAL";

pub const PSYCHOTROPIC_HEX: &str = "#00a859";
pub const NARCOTIC_HEX: &str = "#ffcc00";
