//! Medication record model
//!
//! A record is a flat set of optional string fields. Every field has a
//! stable column key that doubles as the CSV column name, the log column
//! name and the JSON key used by `decode` output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_key;
use crate::payload::constants::{DEFAULT_CITATION, NARCOTIC_HEX, PSYCHOTROPIC_HEX};
use crate::{Error, Result};

/// A single record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Concentration,
    Form,
    Presentation,
    Control,
    SanitaryRegistration,
    ProductCode,
    Batch,
    ManufactureDate,
    ExpiryDate,
    Manufacturer,
    Importer,
    RepackagingEntity,
    RepackagingDate,
    Storage,
    Warnings,
    RegulatoryCitation,
    Url,
}

impl Field {
    /// Every field, in log column order
    pub const ALL: [Field; 18] = [
        Field::Name,
        Field::Concentration,
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
        Field::Url,
    ];

    /// Fields that must be filled before a label can be encoded
    pub const REQUIRED: [Field; 9] = [
        Field::Name,
        Field::Concentration,
        Field::Form,
        Field::Presentation,
        Field::Batch,
        Field::ManufactureDate,
        Field::ExpiryDate,
        Field::SanitaryRegistration,
        Field::Manufacturer,
    ];

    /// Stable column key
    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "nombre_generico",
            Field::Concentration => "concentracion",
            Field::Form => "forma_farmaceutica",
            Field::Presentation => "presentacion",
            Field::Control => "control",
            Field::SanitaryRegistration => "registro_sanitario",
            Field::ProductCode => "codigo_producto",
            Field::Batch => "lote",
            Field::ManufactureDate => "fecha_fabricacion",
            Field::ExpiryDate => "fecha_vencimiento",
            Field::Manufacturer => "fabricante",
            Field::Importer => "importador",
            Field::RepackagingEntity => "id_hospital",
            Field::RepackagingDate => "fecha_reempaque",
            Field::Storage => "conservacion",
            Field::Warnings => "advertencias",
            Field::RegulatoryCitation => "normativa",
            Field::Url => "url_qr",
        }
    }

    /// Human label, used when reporting missing fields
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Nombre genérico",
            Field::Concentration => "Concentración",
            Field::Form => "Forma farmacéutica",
            Field::Presentation => "Presentación",
            Field::Control => "Tipo de control",
            Field::SanitaryRegistration => "Registro sanitario",
            Field::ProductCode => "Código producto",
            Field::Batch => "Lote",
            Field::ManufactureDate => "Fecha fabricación",
            Field::ExpiryDate => "Fecha vencimiento",
            Field::Manufacturer => "Fabricante",
            Field::Importer => "Importador",
            Field::RepackagingEntity => "Entidad",
            Field::RepackagingDate => "Fecha reempaque",
            Field::Storage => "Conservación",
            Field::Warnings => "Advertencias",
            Field::RegulatoryCitation => "Normativa",
            Field::Url => "URL",
        }
    }

    /// Look up a field by its exact column key
    pub fn from_key(key: &str) -> Option<Field> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Medication metadata carried by a label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicationRecord {
    #[serde(rename = "nombre_generico")]
    pub name: String,
    #[serde(rename = "concentracion")]
    pub concentration: String,
    #[serde(rename = "forma_farmaceutica")]
    pub form: String,
    #[serde(rename = "presentacion")]
    pub presentation: String,
    #[serde(rename = "control")]
    pub control: String,
    #[serde(rename = "registro_sanitario")]
    pub sanitary_registration: String,
    #[serde(rename = "codigo_producto")]
    pub product_code: String,
    #[serde(rename = "lote")]
    pub batch: String,
    #[serde(rename = "fecha_fabricacion")]
    pub manufacture_date: String,
    #[serde(rename = "fecha_vencimiento")]
    pub expiry_date: String,
    #[serde(rename = "fabricante")]
    pub manufacturer: String,
    #[serde(rename = "importador")]
    pub importer: String,
    #[serde(rename = "id_hospital")]
    pub repackaging_entity: String,
    #[serde(rename = "fecha_reempaque")]
    pub repackaging_date: String,
    #[serde(rename = "conservacion")]
    pub storage: String,
    #[serde(rename = "advertencias")]
    pub warnings: String,
    #[serde(rename = "normativa")]
    pub regulatory_citation: String,
    #[serde(rename = "url_qr")]
    pub url: String,
}

impl MedicationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, field: Field, value: impl AsRef<str>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Concentration => &self.concentration,
            Field::Form => &self.form,
            Field::Presentation => &self.presentation,
            Field::Control => &self.control,
            Field::SanitaryRegistration => &self.sanitary_registration,
            Field::ProductCode => &self.product_code,
            Field::Batch => &self.batch,
            Field::ManufactureDate => &self.manufacture_date,
            Field::ExpiryDate => &self.expiry_date,
            Field::Manufacturer => &self.manufacturer,
            Field::Importer => &self.importer,
            Field::RepackagingEntity => &self.repackaging_entity,
            Field::RepackagingDate => &self.repackaging_date,
            Field::Storage => &self.storage,
            Field::Warnings => &self.warnings,
            Field::RegulatoryCitation => &self.regulatory_citation,
            Field::Url => &self.url,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Concentration => &mut self.concentration,
            Field::Form => &mut self.form,
            Field::Presentation => &mut self.presentation,
            Field::Control => &mut self.control,
            Field::SanitaryRegistration => &mut self.sanitary_registration,
            Field::ProductCode => &mut self.product_code,
            Field::Batch => &mut self.batch,
            Field::ManufactureDate => &mut self.manufacture_date,
            Field::ExpiryDate => &mut self.expiry_date,
            Field::Manufacturer => &mut self.manufacturer,
            Field::Importer => &mut self.importer,
            Field::RepackagingEntity => &mut self.repackaging_entity,
            Field::RepackagingDate => &mut self.repackaging_date,
            Field::Storage => &mut self.storage,
            Field::Warnings => &mut self.warnings,
            Field::RegulatoryCitation => &mut self.regulatory_citation,
            Field::Url => &mut self.url,
        }
    }

    /// Set a field, trimming surrounding whitespace
    pub fn set(&mut self, field: Field, value: impl AsRef<str>) {
        *self.slot(field) = value.as_ref().trim().to_string();
    }

    /// True when no field holds a value
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_empty())
    }

    /// Fields holding a non-empty value, in column order
    pub fn populated(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::ALL
            .iter()
            .map(move |f| (*f, self.get(*f)))
            .filter(|(_, v)| !v.trim().is_empty())
    }

    /// Required fields that are blank
    pub fn missing_required(&self) -> Vec<Field> {
        Field::REQUIRED
            .iter()
            .copied()
            .filter(|f| self.get(*f).trim().is_empty())
            .collect()
    }

    /// Check required fields before any encoding work starts
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingFields(
                missing.iter().map(|f| f.label().to_string()).collect(),
            ))
        }
    }

    /// Fill blank control and citation fields from the given defaults
    pub fn apply_defaults(&mut self, defaults: &RecordDefaults) {
        if self.control.trim().is_empty() {
            self.set(Field::Control, &defaults.control);
        }
        if self.regulatory_citation.trim().is_empty() {
            self.set(Field::RegulatoryCitation, &defaults.citation);
        }
    }

    /// Control class, defaulting to psychotropic when unrecognized
    pub fn control_class(&self) -> ControlClass {
        ControlClass::from_label(&self.control).unwrap_or(ControlClass::Psychotropic)
    }

    /// Name and concentration joined by a space
    pub fn display_name(&self) -> String {
        join_nonempty(&[self.name.as_str(), self.concentration.as_str()], " ")
    }

    /// Form and presentation joined by ` - `
    pub fn form_and_presentation(&self) -> String {
        join_nonempty(&[self.form.as_str(), self.presentation.as_str()], " - ")
    }
}

pub(crate) fn join_nonempty(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Values filled into blank fields before encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDefaults {
    pub control: String,
    pub citation: String,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            control: ControlClass::Psychotropic.label().to_string(),
            citation: DEFAULT_CITATION.to_string(),
        }
    }
}

/// Special-control classification printed on the label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlClass {
    Psychotropic,
    Narcotic,
}

impl ControlClass {
    /// Classify free text such as `Psicotrópico` or `ESTUPEFACIENTE`
    pub fn from_label(label: &str) -> Option<Self> {
        let key = normalize_key(label);
        if key.contains("estupe") || key.contains("narcotic") {
            Some(ControlClass::Narcotic)
        } else if key.contains("psico") || key.contains("psycho") {
            Some(ControlClass::Psychotropic)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ControlClass::Psychotropic => "Psicotrópico",
            ControlClass::Narcotic => "Estupefaciente",
        }
    }

    /// Band colour: green for psychotropics, yellow for narcotics
    pub fn accent_hex(self) -> &'static str {
        match self {
            ControlClass::Psychotropic => PSYCHOTROPIC_HEX,
            ControlClass::Narcotic => NARCOTIC_HEX,
        }
    }

    pub fn accent_rgb(self) -> [u8; 3] {
        match self {
            ControlClass::Psychotropic => [0x00, 0xa8, 0x59],
            ControlClass::Narcotic => [0xff, 0xcc, 0x00],
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_record() -> MedicationRecord {
    MedicationRecord::new()
        .with(Field::Name, "CLONAZEPAM")
        .with(Field::Concentration, "2 mg")
        .with(Field::Form, "Tableta")
        .with(Field::Presentation, "Blíster x10")
        .with(Field::Control, "Psicotrópico")
        .with(Field::SanitaryRegistration, "INVIMA 2019M-000000-R1")
        .with(Field::Batch, "ABC123")
        .with(Field::ManufactureDate, "04/2024")
        .with(Field::ExpiryDate, "12/2025")
        .with(Field::Manufacturer, "Laboratorio XYZ S.A.")
        .with(Field::Importer, "Import Pharma SAS")
        .with(Field::RepackagingEntity, "Hospital ABC")
        .with(Field::RepackagingDate, "04/2024")
        .with(Field::Storage, "Conservar a temperatura ambiente (<25°C), protegido de la luz y humedad.")
        .with(Field::Warnings, "Venta bajo fórmula médica. Manténgase fuera del alcance de los niños.")
        .with(Field::RegulatoryCitation, DEFAULT_CITATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique_and_resolvable() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
    }

    #[test]
    fn test_set_trims_value() {
        let record = MedicationRecord::new().with(Field::Batch, "  ABC123 \n");
        assert_eq!(record.batch, "ABC123");
    }

    #[test]
    fn test_validate_lists_missing_labels() {
        let record = MedicationRecord::new().with(Field::Name, "CLONAZEPAM");
        match record.validate() {
            Err(Error::MissingFields(missing)) => {
                assert_eq!(missing.len(), 8);
                assert!(missing.contains(&"Lote".to_string()));
                assert!(!missing.contains(&"Nombre genérico".to_string()));
            }
            other => panic!("expected missing fields, got {:?}", other),
        }
    }

    #[test]
    fn test_sample_record_is_valid() {
        assert!(sample_record().validate().is_ok());
    }

    #[test]
    fn test_control_class_from_label() {
        assert_eq!(ControlClass::from_label("Psicotrópico"), Some(ControlClass::Psychotropic));
        assert_eq!(ControlClass::from_label("ESTUPEFACIENTE"), Some(ControlClass::Narcotic));
        assert_eq!(ControlClass::from_label("otro"), None);
        assert_eq!(MedicationRecord::new().control_class(), ControlClass::Psychotropic);
    }

    #[test]
    fn test_apply_defaults_keeps_existing_values() {
        let mut record = MedicationRecord::new().with(Field::Control, "Estupefaciente");
        record.apply_defaults(&RecordDefaults::default());
        assert_eq!(record.control, "Estupefaciente");
        assert_eq!(record.regulatory_citation, DEFAULT_CITATION);
    }

    #[test]
    fn test_serde_uses_column_keys() {
        let record = MedicationRecord::new().with(Field::Batch, "L1");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["lote"], "L1");
        assert_eq!(json["nombre_generico"], "");

        let parsed: MedicationRecord = serde_json::from_str(r#"{"lote":"L2"}"#).unwrap();
        assert_eq!(parsed.batch, "L2");
        assert_eq!(parsed.name, "");
    }
}
