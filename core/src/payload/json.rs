//! Structured JSON payload

use serde::Serialize;

use crate::payload::constants::{CITATION_SEPARATOR, JSON_PAYLOAD_VERSION};
use crate::record::MedicationRecord;
use crate::Result;

/// Top-level JSON payload, grouped the way label readers expect
#[derive(Debug, Serialize)]
struct JsonPayload<'a> {
    v: u8,
    normativa: Vec<&'a str>,
    producto: Producto<'a>,
    lote: Lote<'a>,
    fabricante: &'a str,
    importador: &'a str,
    entidad: Entidad<'a>,
    conservacion: &'a str,
    advertencias: &'a str,
}

#[derive(Debug, Serialize)]
struct Producto<'a> {
    nombre_generico: &'a str,
    concentracion: &'a str,
    forma_farmaceutica: &'a str,
    presentacion: &'a str,
    registro_sanitario: &'a str,
    control: &'a str,
    codigo: &'a str,
}

#[derive(Debug, Serialize)]
struct Lote<'a> {
    codigo: &'a str,
    fecha_fabricacion: &'a str,
    fecha_vencimiento: &'a str,
}

#[derive(Debug, Serialize)]
struct Entidad<'a> {
    id: &'a str,
    reempaque: &'a str,
}

impl<'a> From<&'a MedicationRecord> for JsonPayload<'a> {
    fn from(r: &'a MedicationRecord) -> Self {
        Self {
            v: JSON_PAYLOAD_VERSION,
            normativa: r
                .regulatory_citation
                .split(CITATION_SEPARATOR)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect(),
            producto: Producto {
                nombre_generico: &r.name,
                concentracion: &r.concentration,
                forma_farmaceutica: &r.form,
                presentacion: &r.presentation,
                registro_sanitario: &r.sanitary_registration,
                control: &r.control,
                codigo: &r.product_code,
            },
            lote: Lote {
                codigo: &r.batch,
                fecha_fabricacion: &r.manufacture_date,
                fecha_vencimiento: &r.expiry_date,
            },
            fabricante: &r.manufacturer,
            importador: &r.importer,
            entidad: Entidad {
                id: &r.repackaging_entity,
                reempaque: &r.repackaging_date,
            },
            conservacion: &r.storage,
            advertencias: &r.warnings,
        }
    }
}

/// Serialize a record as compact JSON (no extraneous whitespace, UTF-8 kept as is)
pub fn build_json_payload(record: &MedicationRecord) -> Result<String> {
    Ok(serde_json::to_string(&JsonPayload::from(record))?)
}
