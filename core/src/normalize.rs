//! Label normalization and the alias table
//!
//! Producers have changed their label spellings over time (accents, icons,
//! abbreviations, composite labels). Every decoder funnels labels through
//! [`normalize_key`] and looks the result up in [`ALIASES`], so a label
//! change on the encoder side only needs a new alias here.

use std::sync::LazyLock;

use regex::Regex;

use crate::record::{Field, MedicationRecord};

/// Fold an accented Latin letter to its ASCII base letter
pub fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Normalize a label to `[a-z0-9]+(_[a-z0-9]+)*`
///
/// Lowercases, folds accents, turns every other character (spaces,
/// punctuation, icons) into a separator, collapses separator runs and
/// trims them from both ends. Applying it twice changes nothing.
pub fn normalize_key(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_sep = false;

    for c in label.chars().flat_map(char::to_lowercase).map(fold_accent) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }

    out
}

/// How a composite value is split into two fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRule {
    /// `CLONAZEPAM 2 mg` -> name `CLONAZEPAM`, concentration `2 mg`
    NameConcentration,
    /// `Tableta - Blíster x10` -> form `Tableta`, presentation `Blíster x10`
    FormPresentation,
}

static NAME_CONCENTRATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)[\s,;-]+(\d.*)$").expect("valid regex"));

const FORM_SEPARATORS: [char; 3] = ['·', '-', '|'];

impl SplitRule {
    pub fn fields(self) -> (Field, Field) {
        match self {
            SplitRule::NameConcentration => (Field::Name, Field::Concentration),
            SplitRule::FormPresentation => (Field::Form, Field::Presentation),
        }
    }

    pub fn split(self, value: &str) -> (String, String) {
        let value = value.trim();
        match self {
            SplitRule::NameConcentration => split_name_concentration(value),
            SplitRule::FormPresentation => split_form_presentation(value),
        }
    }
}

fn split_name_concentration(value: &str) -> (String, String) {
    // A head without letters is part of a number (`2,5 mg`), not a name
    if let Some(caps) = NAME_CONCENTRATION.captures(value) {
        if caps[1].chars().any(char::is_alphabetic) {
            return (caps[1].trim().to_string(), caps[2].trim().to_string());
        }
    }
    if value.starts_with(|c: char| c.is_ascii_digit()) {
        (String::new(), value.to_string())
    } else {
        (value.to_string(), String::new())
    }
}

fn split_form_presentation(value: &str) -> (String, String) {
    let trim = |s: &str| {
        s.trim_matches(|c: char| c.is_whitespace() || FORM_SEPARATORS.contains(&c))
            .to_string()
    };

    // Separators are tried in priority order, not by position.
    for sep in FORM_SEPARATORS {
        if let Some((form, presentation)) = value.split_once(sep) {
            return (trim(form), trim(presentation));
        }
    }
    (value.to_string(), String::new())
}

/// Where a recognized label's value goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Field(Field),
    Split(SplitRule),
    /// Whole value goes to the first field; see [`settle`]
    SplitIfAlone(SplitRule),
}

/// Normalized label -> target
pub const ALIASES: &[(&str, Target)] = &[
    ("medicamento", Target::Split(SplitRule::NameConcentration)),
    ("nombre_generico", Target::Field(Field::Name)),
    ("nombre", Target::Field(Field::Name)),
    ("concentracion", Target::Field(Field::Concentration)),
    ("forma", Target::SplitIfAlone(SplitRule::FormPresentation)),
    ("forma_presentacion", Target::Split(SplitRule::FormPresentation)),
    ("formapresentacion", Target::Split(SplitRule::FormPresentation)),
    ("forma_farmaceutica", Target::Field(Field::Form)),
    ("presentacion", Target::Field(Field::Presentation)),
    ("tipo_de_control", Target::Field(Field::Control)),
    ("tipo_control", Target::Field(Field::Control)),
    ("control", Target::Field(Field::Control)),
    ("registro_sanitario", Target::Field(Field::SanitaryRegistration)),
    ("reg_sanitario", Target::Field(Field::SanitaryRegistration)),
    ("regsan", Target::Field(Field::SanitaryRegistration)),
    ("regsani", Target::Field(Field::SanitaryRegistration)),
    ("codigo", Target::Field(Field::ProductCode)),
    ("codigo_producto", Target::Field(Field::ProductCode)),
    ("lote", Target::Field(Field::Batch)),
    ("fecha_fabricacion", Target::Field(Field::ManufactureDate)),
    ("fabricacion", Target::Field(Field::ManufactureDate)),
    ("fab", Target::Field(Field::ManufactureDate)),
    ("fecha_vencimiento", Target::Field(Field::ExpiryDate)),
    ("vencimiento", Target::Field(Field::ExpiryDate)),
    ("vence", Target::Field(Field::ExpiryDate)),
    ("fabricante", Target::Field(Field::Manufacturer)),
    ("importador", Target::Field(Field::Importer)),
    ("entidad", Target::Field(Field::RepackagingEntity)),
    ("id_entidad", Target::Field(Field::RepackagingEntity)),
    ("id_hospital", Target::Field(Field::RepackagingEntity)),
    ("reempaque", Target::Field(Field::RepackagingDate)),
    ("fecha_reempaque", Target::Field(Field::RepackagingDate)),
    ("conservacion", Target::Field(Field::Storage)),
    ("advertencias", Target::Field(Field::Warnings)),
    ("normativa", Target::Field(Field::RegulatoryCitation)),
    ("url", Target::Field(Field::Url)),
    ("url_qr", Target::Field(Field::Url)),
];

/// Resolve a raw label through normalization and the alias table
pub fn resolve(label: &str) -> Option<Target> {
    let key = normalize_key(label);
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, target)| *target)
}

/// Store a value in the record according to its target
pub fn assign(record: &mut MedicationRecord, target: Target, value: &str) {
    match target {
        Target::Field(field) => record.set(field, value),
        Target::Split(rule) => {
            let (first, second) = rule.fields();
            let (a, b) = rule.split(value);
            record.set(first, a);
            record.set(second, b);
        }
        Target::SplitIfAlone(rule) => record.set(rule.fields().0, value),
    }
}

/// Split the first field of `rule` in place when its second field is blank
///
/// Run once every label of a scan has been assigned, so a `FORMA` line
/// followed by its own `PRESENTACIÓN` line keeps the form intact.
pub fn settle(record: &mut MedicationRecord, rule: SplitRule) {
    let (first, second) = rule.fields();
    if !record.get(second).is_empty() {
        return;
    }
    let (a, b) = rule.split(record.get(first));
    record.set(first, a);
    record.set(second, b);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_folds_accents_and_punctuation() {
        assert_eq!(normalize_key("FECHA FABRICACIÓN"), "fecha_fabricacion");
        assert_eq!(normalize_key("Forma/Presentación"), "forma_presentacion");
        assert_eq!(normalize_key("REG. SANITARIO"), "reg_sanitario");
        assert_eq!(normalize_key("  Tipo de   control "), "tipo_de_control");
    }

    #[test]
    fn test_normalize_strips_icons() {
        assert_eq!(normalize_key("🏷️ Lote"), "lote");
        assert_eq!(normalize_key("❄️ Conservación"), "conservacion");
        assert_eq!(normalize_key("📋"), "");
    }

    #[test]
    fn test_resolve_aliases() {
        assert_eq!(resolve("Vence"), Some(Target::Field(Field::ExpiryDate)));
        assert_eq!(resolve("📦 Reempaque"), Some(Target::Field(Field::RepackagingDate)));
        assert_eq!(
            resolve("MEDICAMENTO"),
            Some(Target::Split(SplitRule::NameConcentration))
        );
        assert_eq!(resolve("color favorito"), None);
    }

    #[test]
    fn test_split_name_concentration() {
        let rule = SplitRule::NameConcentration;
        assert_eq!(rule.split("CLONAZEPAM 2 mg"), ("CLONAZEPAM".into(), "2 mg".into()));
        assert_eq!(rule.split("VITAMINA B12 500 mcg"), ("VITAMINA B12".into(), "500 mcg".into()));
        assert_eq!(rule.split("MORFINA, 10 mg/mL"), ("MORFINA".into(), "10 mg/mL".into()));
        assert_eq!(rule.split("ACIDO VALPROICO"), ("ACIDO VALPROICO".into(), String::new()));
        assert_eq!(rule.split("5 mg"), (String::new(), "5 mg".into()));
        assert_eq!(rule.split("2,5 mg"), (String::new(), "2,5 mg".into()));
        assert_eq!(
            rule.split("5-FLUOROURACILO 500 mg"),
            ("5-FLUOROURACILO".into(), "500 mg".into())
        );
        assert_eq!(
            rule.split("6-MERCAPTOPURINA, 50 mg"),
            ("6-MERCAPTOPURINA".into(), "50 mg".into())
        );
    }

    #[test]
    fn test_split_form_presentation() {
        let rule = SplitRule::FormPresentation;
        assert_eq!(rule.split("Tableta - Blíster x10"), ("Tableta".into(), "Blíster x10".into()));
        assert_eq!(rule.split("Ampolla · Caja x5"), ("Ampolla".into(), "Caja x5".into()));
        assert_eq!(rule.split("Jarabe | Frasco 120 mL"), ("Jarabe".into(), "Frasco 120 mL".into()));
        assert_eq!(rule.split("Tableta"), ("Tableta".into(), String::new()));
    }

    #[test]
    fn test_split_prefers_middle_dot_over_hyphen() {
        let rule = SplitRule::FormPresentation;
        assert_eq!(
            rule.split("Tableta-recubierta · Caja x30"),
            ("Tableta-recubierta".into(), "Caja x30".into())
        );
    }

    #[test]
    fn test_assign_split_sets_both_fields() {
        let mut record = MedicationRecord::new();
        assign(&mut record, Target::Split(SplitRule::NameConcentration), "CLONAZEPAM 2 mg");
        assert_eq!(record.name, "CLONAZEPAM");
        assert_eq!(record.concentration, "2 mg");
    }

    #[test]
    fn test_forma_waits_for_presentation() {
        let target = resolve("FORMA").unwrap();
        assert_eq!(target, Target::SplitIfAlone(SplitRule::FormPresentation));

        let mut record = MedicationRecord::new();
        assign(&mut record, target, "Tableta-recubierta");
        assign(&mut record, resolve("PRESENTACIÓN").unwrap(), "Caja");
        settle(&mut record, SplitRule::FormPresentation);
        assert_eq!(record.form, "Tableta-recubierta");
        assert_eq!(record.presentation, "Caja");

        let mut record = MedicationRecord::new();
        assign(&mut record, target, "Tableta - Blíster x10");
        settle(&mut record, SplitRule::FormPresentation);
        assert_eq!(record.form, "Tableta");
        assert_eq!(record.presentation, "Blíster x10");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "\\PC*") {
            let once = normalize_key(&s);
            prop_assert_eq!(normalize_key(&once), once);
        }

        #[test]
        fn normalize_output_is_restricted(s in "\\PC*") {
            let key = normalize_key(&s);
            prop_assert!(key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            prop_assert!(!key.starts_with('_') && !key.ends_with('_') && !key.contains("__"));
        }
    }
}
