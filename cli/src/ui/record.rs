//! Record and warning printing.

use medqr_core::MedicationRecord;

/// Print the populated fields of a record, one per line.
pub fn print_record(record: &MedicationRecord) {
    let populated: Vec<_> = record.populated().collect();
    let width = populated
        .iter()
        .map(|(field, _)| field.label().chars().count())
        .max()
        .unwrap_or(0);

    for (field, value) in populated {
        let label = field.label();
        let pad = width - label.chars().count();
        println!("  \x1b[1m{}:\x1b[0m{} {}", label, " ".repeat(pad), value);
    }
}

pub fn print_warnings(warnings: &[String]) {
    for w in warnings {
        println!("  \x1b[1;33m⚠\x1b[0m {}", w);
    }
}
