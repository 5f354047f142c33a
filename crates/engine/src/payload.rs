//! Projection of the form state into the payload handed to the record service.

use wizard_types::{FieldKind, FieldValue, FormState, WizardDefinition};

/// Builds the submission payload for `form_state`.
///
/// Every declared field except display fields is included, hidden fields too,
/// in declaration order. Keys the definition does not declare (for example a
/// seeded record id) are dropped. Missing and blank values become `null`, and
/// numeric text in number fields is sent as a number.
pub fn project_payload(definition: &WizardDefinition, form_state: &FormState) -> FormState {
    definition
        .fields()
        .filter(|(_, field)| field.is_submitted())
        .map(|(_, field)| {
            let value = match form_state.meaningful(&field.name) {
                None => FieldValue::Null,
                Some(value) if matches!(field.kind, FieldKind::Number) => numeric(value),
                Some(value) => value.clone(),
            };
            (field.name.clone(), value)
        })
        .collect()
}

fn numeric(value: &FieldValue) -> FieldValue {
    let Some(text) = value.as_text().map(str::trim) else {
        return value.clone();
    };
    if let Ok(integer) = text.parse::<i64>() {
        return FieldValue::from(integer);
    }
    match text.parse::<f64>() {
        Ok(float) if float.is_finite() => FieldValue::from(float),
        _ => value.clone(),
    }
}
