//! Mini HTML page payload framed as a `data:text/html` URI

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::payload::constants::{HTML_DATA_URI_BASE64, HTML_DATA_URI_PLAIN, HTML_HEADER_TEXT};
use crate::record::MedicationRecord;

/// Escape text for interpolation into markup
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Label/value rows of the table, blank values omitted
pub fn html_rows(r: &MedicationRecord) -> Vec<(&'static str, String)> {
    let rows = [
        ("🏥 Medicamento", r.display_name()),
        ("💊 Forma/Presentación", r.form_and_presentation()),
        ("🔢 Código", r.product_code.clone()),
        ("🔒 Control", r.control.clone()),
        ("📋 Registro sanitario", r.sanitary_registration.clone()),
        ("🏷️ Lote", r.batch.clone()),
        ("📅 Fabricación", r.manufacture_date.clone()),
        ("⏰ Vencimiento", r.expiry_date.clone()),
        ("🏭 Fabricante", r.manufacturer.clone()),
        ("📦 Importador", r.importer.clone()),
        ("🏥 Entidad", r.repackaging_entity.clone()),
        ("📦 Reempaque", r.repackaging_date.clone()),
        ("❄️ Conservación", r.storage.clone()),
        ("⚠️ Advertencias", r.warnings.clone()),
        ("📜 Normativa", r.regulatory_citation.clone()),
    ];

    rows.into_iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .collect()
}

/// Full HTML document shown by phone cameras when the code is scanned
pub fn html_document(record: &MedicationRecord) -> String {
    let accent = record.control_class().accent_hex();
    let mut html = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
<title>Información del Medicamento</title><style>\
body{{font:14px system-ui,Arial;margin:15px;background:#f8f9fa}}\
.h{{background:{accent};color:#fff;padding:12px;border-radius:8px;text-align:center;font-weight:bold}}\
table{{width:100%;border-collapse:collapse;background:#fff;margin-top:15px}}\
th,td{{padding:10px;border-bottom:1px solid #eee;text-align:left}}\
th{{background:#f1f3f4;width:35%;font-size:13px}}\
.n{{font-size:16px;font-weight:bold;color:{accent}}}\
</style></head><body><div class=\"h\">{header}</div><table>",
        accent = accent,
        header = HTML_HEADER_TEXT,
    );

    for (i, (label, value)) in html_rows(record).iter().enumerate() {
        let class = if i == 0 { " class=\"n\"" } else { "" };
        html.push_str(&format!(
            "<tr><th>{}</th><td{}>{}</td></tr>",
            escape_html(label),
            class,
            escape_html(value)
        ));
    }

    html.push_str("</table></body></html>");
    html
}

/// Frame the HTML document as a data URI, percent-encoded or base64
pub fn build_html_payload(record: &MedicationRecord, base64: bool) -> String {
    let html = html_document(record);
    if base64 {
        format!("{}{}", HTML_DATA_URI_BASE64, BASE64.encode(html.as_bytes()))
    } else {
        format!("{}{}", HTML_DATA_URI_PLAIN, urlencoding::encode(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{sample_record, Field};

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<25°C & \"seco\">"), "&lt;25°C &amp; &quot;seco&quot;&gt;");
    }

    #[test]
    fn test_rows_skip_blank_values() {
        let record = MedicationRecord::new()
            .with(Field::Name, "CLONAZEPAM")
            .with(Field::Batch, "ABC123");
        let rows = html_rows(&record);
        assert_eq!(
            rows,
            vec![("🏥 Medicamento", "CLONAZEPAM".to_string()), ("🏷️ Lote", "ABC123".to_string())]
        );
    }

    #[test]
    fn test_document_escapes_values() {
        let record = MedicationRecord::new()
            .with(Field::Name, "A&B")
            .with(Field::Storage, "Conservar <25°C");
        let html = html_document(&record);
        assert!(html.contains("<td class=\"n\">A&amp;B</td>"));
        assert!(html.contains("<td>Conservar &lt;25°C</td>"));
        assert!(!html.contains("<25°C"));
    }

    #[test]
    fn test_accent_follows_control_class() {
        let record = MedicationRecord::new().with(Field::Control, "Estupefaciente");
        assert!(html_document(&record).contains("#ffcc00"));
        assert!(html_document(&sample_record()).contains("#00a859"));
    }

    #[test]
    fn test_data_uri_framing() {
        let plain = build_html_payload(&sample_record(), false);
        let b64 = build_html_payload(&sample_record(), true);
        assert!(plain.starts_with("data:text/html,%3C%21doctype"));
        assert!(b64.starts_with("data:text/html;base64,"));
        assert!(plain.is_ascii());
        assert!(b64.is_ascii());
    }
}
