//! Delimited-text payload: `LABEL: value` lines

use crate::record::MedicationRecord;

/// A titled group of labeled lines
struct Section {
    title: &'static str,
    lines: Vec<(&'static str, String)>,
}

fn sections(record: &MedicationRecord) -> Vec<Section> {
    vec![
        Section {
            title: "INFORMACIÓN DEL MEDICAMENTO",
            lines: vec![
                ("MEDICAMENTO", record.display_name()),
                ("FORMA FARMACÉUTICA", record.form.clone()),
                ("PRESENTACIÓN", record.presentation.clone()),
                ("CÓDIGO PRODUCTO", record.product_code.clone()),
                ("TIPO DE CONTROL", record.control.clone()),
                ("REGISTRO SANITARIO", record.sanitary_registration.clone()),
            ],
        },
        Section {
            title: "INFORMACIÓN DEL LOTE",
            lines: vec![
                ("LOTE", record.batch.clone()),
                ("FECHA FABRICACIÓN", record.manufacture_date.clone()),
                ("FECHA VENCIMIENTO", record.expiry_date.clone()),
            ],
        },
        Section {
            title: "FABRICACIÓN",
            lines: vec![
                ("FABRICANTE", record.manufacturer.clone()),
                ("IMPORTADOR", record.importer.clone()),
            ],
        },
        Section {
            title: "REEMPAQUE",
            lines: vec![
                ("ENTIDAD", record.repackaging_entity.clone()),
                ("FECHA REEMPAQUE", record.repackaging_date.clone()),
            ],
        },
        Section {
            title: "CONSERVACIÓN Y ADVERTENCIAS",
            lines: vec![
                ("CONSERVACIÓN", record.storage.clone()),
                ("ADVERTENCIAS", record.warnings.clone()),
            ],
        },
    ]
}

/// The seven lines kept when capacity is tight
fn priority_lines(record: &MedicationRecord) -> [(&'static str, String); 7] {
    [
        ("MEDICAMENTO", record.display_name()),
        ("FORMA", record.form_and_presentation()),
        ("REG. SANITARIO", record.sanitary_registration.clone()),
        ("LOTE", record.batch.clone()),
        ("FABRICACION", record.manufacture_date.clone()),
        ("VENCIMIENTO", record.expiry_date.clone()),
        ("FABRICANTE", record.manufacturer.clone()),
    ]
}

/// Replace embedded line breaks with one space; other whitespace is kept
fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_line(out: &mut Vec<String>, label: &str, value: &str) {
    let value = single_line(value);
    let value = value.trim();
    if !value.is_empty() {
        out.push(format!("{}: {}", label, value));
    }
}

/// Build the delimited-text payload
///
/// Blank fields are omitted. The full variant groups lines under
/// `=== SECTION ===` headers and ends with the regulatory citation; the
/// compact variant keeps only the seven priority lines.
pub fn build_text_payload(record: &MedicationRecord, compact: bool) -> String {
    let mut out = Vec::new();

    if compact {
        for (label, value) in priority_lines(record) {
            push_line(&mut out, label, &value);
        }
        return out.join("\n");
    }

    for section in sections(record) {
        let mut lines = Vec::new();
        for (label, value) in &section.lines {
            push_line(&mut lines, label, value);
        }
        if !lines.is_empty() {
            out.push(format!("=== {} ===", section.title));
            out.extend(lines);
        }
    }
    push_line(&mut out, "NORMATIVA", &record.regulatory_citation);

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{sample_record, Field};

    #[test]
    fn test_full_text_layout() {
        let text = build_text_payload(&sample_record(), false);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "=== INFORMACIÓN DEL MEDICAMENTO ===");
        assert_eq!(lines[1], "MEDICAMENTO: CLONAZEPAM 2 mg");
        assert!(lines.contains(&"LOTE: ABC123"));
        assert!(lines.contains(&"=== REEMPAQUE ==="));
        assert_eq!(*lines.last().unwrap(), "NORMATIVA: Res 1478/2006 - Circ 01/2016 FNE");
    }

    #[test]
    fn test_blank_fields_and_empty_sections_are_omitted() {
        let record = MedicationRecord::new()
            .with(Field::Name, "CLONAZEPAM")
            .with(Field::Batch, "ABC123");
        let text = build_text_payload(&record, false);
        assert!(!text.contains("IMPORTADOR"));
        assert!(!text.contains("REEMPAQUE"));
        assert!(!text.contains("NORMATIVA"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_compact_keeps_priority_lines_only() {
        let text = build_text_payload(&sample_record(), true);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "FORMA: Tableta - Blíster x10");
        assert!(!text.contains("==="));
        assert!(!text.contains("IMPORTADOR"));
    }

    #[test]
    fn test_multiline_values_are_flattened() {
        let record = MedicationRecord::new().with(Field::Warnings, "Uso bajo control.\nNo exceder dosis.");
        let text = build_text_payload(&record, false);
        assert!(text.contains("ADVERTENCIAS: Uso bajo control. No exceder dosis."));

        let record = MedicationRecord::new().with(Field::Warnings, "Uno\r\nDos\rTres");
        let text = build_text_payload(&record, false);
        assert!(text.contains("ADVERTENCIAS: Uno Dos Tres"));
    }

    #[test]
    fn test_inner_whitespace_is_kept() {
        let record = MedicationRecord::new()
            .with(Field::Storage, "Conservar  en lugar fresco")
            .with(Field::Warnings, "No\tagitar");
        let text = build_text_payload(&record, false);
        assert!(text.contains("CONSERVACIÓN: Conservar  en lugar fresco"));
        assert!(text.contains("ADVERTENCIAS: No\tagitar"));
    }
}
