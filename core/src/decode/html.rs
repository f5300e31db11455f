//! HTML data-URI decoder

use std::sync::LazyLock;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use regex::Regex;

use crate::decode::{ParseOutcome, RecordBuilder};
use crate::payload::constants::{HTML_DATA_URI_BASE64, HTML_DATA_URI_PREFIX};

static TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<tr>\s*<th[^>]*>(.*?)</th>\s*<td[^>]*>(.*?)</td>\s*</tr>")
        .expect("valid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

/// Decode HTML character references
pub(crate) fn unescape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &tail[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn cell_text(cell: &str) -> String {
    unescape_html(&TAG.replace_all(cell, "")).trim().to_string()
}

/// Unwrap the data URI into the HTML document
fn document(raw: &str) -> Result<String, String> {
    if let Some(b64) = raw.strip_prefix(HTML_DATA_URI_BASE64) {
        let bytes = BASE64
            .decode(b64.trim())
            .map_err(|e| format!("invalid base64 body: {}", e))?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    let rest = raw
        .strip_prefix(HTML_DATA_URI_PREFIX)
        .ok_or_else(|| "not an HTML data URI".to_string())?;
    // Media type parameters (e.g. `;charset=utf-8`) end at the first comma.
    let (_, body) = rest
        .split_once(',')
        .ok_or_else(|| "data URI without body".to_string())?;
    urlencoding::decode(body)
        .map(|s| s.into_owned())
        .map_err(|e| format!("invalid percent-encoding: {}", e))
}

/// Parse a `data:text/html` payload by its table rows
pub(crate) fn parse_data_uri(raw: &str) -> ParseOutcome {
    let html = match document(raw) {
        Ok(html) => html,
        Err(reason) => return ParseOutcome::Failed { reason },
    };

    let mut builder = RecordBuilder::default();
    let mut rows = 0;
    for caps in TABLE_ROW.captures_iter(&html) {
        rows += 1;
        builder.labeled(&cell_text(&caps[1]), &cell_text(&caps[2]));
    }
    if rows == 0 {
        builder.warn("HTML document has no table rows");
    }

    builder.finish()
}
