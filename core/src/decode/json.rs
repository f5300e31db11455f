//! JSON decoder for both known payload shapes
//!
//! Current labels use `producto` / `lote` / `entidad`; older v3 labels use
//! `medicamento` / `lote` / `fabricacion` / `reempaque`. Both flatten to the
//! same record. Nulls and missing keys become empty strings.

use serde::Deserialize;
use serde_json::Value;

use crate::decode::{ParseOutcome, RecordBuilder};
use crate::payload::constants::CITATION_SEPARATOR;
use crate::record::Field;

type Text = Option<String>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProductShape {
    producto: ProductoGroup,
    lote: LoteGroup,
    fabricante: Text,
    importador: Text,
    entidad: EntidadGroup,
    conservacion: Text,
    advertencias: Text,
    normativa: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProductoGroup {
    nombre_generico: Text,
    concentracion: Text,
    forma_farmaceutica: Text,
    presentacion: Text,
    registro_sanitario: Text,
    control: Text,
    codigo: Text,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoteGroup {
    codigo: Text,
    fecha_fabricacion: Text,
    fecha_vencimiento: Text,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EntidadGroup {
    id: Text,
    reempaque: Text,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MedicamentoShape {
    medicamento: MedicamentoGroup,
    lote: LoteGroup,
    fabricacion: FabricacionGroup,
    reempaque: ReempaqueGroup,
    conservacion: Text,
    advertencias: Text,
    normativa: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MedicamentoGroup {
    nombre_generico: Text,
    concentracion: Text,
    forma_farmaceutica: Text,
    presentacion: Text,
    tipo_control: Text,
    control: Text,
    registro_sanitario: Text,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FabricacionGroup {
    fabricante: Text,
    importador: Text,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReempaqueGroup {
    entidad: Text,
    fecha: Text,
}

/// `normativa` is an array in every shape seen so far, but tolerate a string
fn citation(value: Option<Value>) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(CITATION_SEPARATOR),
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

fn put(builder: &mut RecordBuilder, field: Field, value: Text) {
    if let Some(v) = value {
        builder.set(field, &v);
    }
}

fn flatten_product(shape: ProductShape, b: &mut RecordBuilder) {
    let p = shape.producto;
    put(b, Field::Name, p.nombre_generico);
    put(b, Field::Concentration, p.concentracion);
    put(b, Field::Form, p.forma_farmaceutica);
    put(b, Field::Presentation, p.presentacion);
    put(b, Field::SanitaryRegistration, p.registro_sanitario);
    put(b, Field::Control, p.control);
    put(b, Field::ProductCode, p.codigo);
    put(b, Field::Batch, shape.lote.codigo);
    put(b, Field::ManufactureDate, shape.lote.fecha_fabricacion);
    put(b, Field::ExpiryDate, shape.lote.fecha_vencimiento);
    put(b, Field::Manufacturer, shape.fabricante);
    put(b, Field::Importer, shape.importador);
    put(b, Field::RepackagingEntity, shape.entidad.id);
    put(b, Field::RepackagingDate, shape.entidad.reempaque);
    put(b, Field::Storage, shape.conservacion);
    put(b, Field::Warnings, shape.advertencias);
    b.set(Field::RegulatoryCitation, &citation(shape.normativa));
}

fn flatten_medicamento(shape: MedicamentoShape, b: &mut RecordBuilder) {
    let m = shape.medicamento;
    put(b, Field::Name, m.nombre_generico);
    put(b, Field::Concentration, m.concentracion);
    put(b, Field::Form, m.forma_farmaceutica);
    put(b, Field::Presentation, m.presentacion);
    put(b, Field::Control, m.tipo_control.filter(|s| !s.is_empty()).or(m.control));
    put(b, Field::SanitaryRegistration, m.registro_sanitario);
    put(b, Field::Batch, shape.lote.codigo);
    put(b, Field::ManufactureDate, shape.lote.fecha_fabricacion);
    put(b, Field::ExpiryDate, shape.lote.fecha_vencimiento);
    put(b, Field::Manufacturer, shape.fabricacion.fabricante);
    put(b, Field::Importer, shape.fabricacion.importador);
    put(b, Field::RepackagingEntity, shape.reempaque.entidad);
    put(b, Field::RepackagingDate, shape.reempaque.fecha);
    put(b, Field::Storage, shape.conservacion);
    put(b, Field::Warnings, shape.advertencias);
    b.set(Field::RegulatoryCitation, &citation(shape.normativa));
}

/// Parse a JSON payload in either known shape
pub(crate) fn parse_json(raw: &str) -> ParseOutcome {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return ParseOutcome::Failed { reason: format!("invalid JSON: {}", e) },
    };

    let mut builder = RecordBuilder::default();
    let result = if value.get("medicamento").is_some_and(Value::is_object) {
        serde_json::from_value::<MedicamentoShape>(value)
            .map(|shape| flatten_medicamento(shape, &mut builder))
    } else if value.get("producto").is_some_and(Value::is_object) {
        serde_json::from_value::<ProductShape>(value)
            .map(|shape| flatten_product(shape, &mut builder))
    } else {
        return ParseOutcome::Failed {
            reason: "unrecognized JSON shape (no producto or medicamento object)".into(),
        };
    };

    if let Err(e) = result {
        return ParseOutcome::Failed { reason: format!("unexpected JSON layout: {}", e) };
    }
    builder.finish()
}
