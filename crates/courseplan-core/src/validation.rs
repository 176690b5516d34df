//! Structural validation of loosely-typed input records.
//!
//! Records arrive as JSON objects. A record may carry keys the schema does
//! not know; those are ignored by validation and dropped by sanitization.
//!
//! Schemas are checked here rather than compiled with `jsonschema` because
//! every field reports its own fixed client message and required-ness
//! depends on the validation mode.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::schema::{FieldKind, FieldSpec, RecordSchema};

/// Sanitized record: only schema-known keys with non-null values.
pub type Record = Map<String, Value>;

/// How required-ness is applied while validating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Every required field must be present and valid; optional fields are skipped.
    Strict,
    /// Only fields present in the record are checked.
    Partial,
}

/// One message per failing field, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolations {
    messages: Vec<String>,
}

impl SchemaViolations {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Compound message with one paragraph per violation.
    pub fn message(&self) -> String {
        self.messages.join("\n\n")
    }
}

impl std::fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Validate `record` against `schema`.
pub fn validate_record(
    record: &Value,
    schema: &RecordSchema,
    mode: ValidationMode,
) -> Result<(), SchemaViolations> {
    let Some(object) = record.as_object() else {
        return Err(SchemaViolations::from_message(
            "Constraint violated: Invalid input type",
        ));
    };

    if object.keys().all(|key| !schema.contains(key)) {
        return Err(SchemaViolations::from_message(
            "Constraint violated: Input has no matching key with schema",
        ));
    }

    let messages: Vec<String> = match mode {
        ValidationMode::Strict => schema
            .fields()
            .iter()
            .filter(|field| field.required)
            .filter_map(|field| field_violation(object, field))
            .collect(),
        ValidationMode::Partial => schema
            .fields()
            .iter()
            .filter(|field| has_property(object, field.name))
            .filter_map(|field| field_violation(object, field))
            .collect(),
    };

    if messages.is_empty() {
        Ok(())
    } else {
        Err(SchemaViolations { messages })
    }
}

/// Copy the schema-known, non-null fields of an already validated record.
///
/// Values are copied as-is; nested objects and lists are not inspected.
pub fn sanitize_record(record: &Value, schema: &RecordSchema) -> Record {
    let mut sanitized = Record::new();
    if let Some(object) = record.as_object() {
        for field in schema.fields() {
            if let Some(value) = object.get(field.name).filter(|value| !value.is_null()) {
                sanitized.insert(field.name.to_string(), value.clone());
            }
        }
    }
    sanitized
}

fn has_property(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).is_some_and(|value| !value.is_null())
}

fn field_violation(object: &Map<String, Value>, field: &FieldSpec) -> Option<String> {
    let Some(value) = object.get(field.name).filter(|value| !value.is_null()) else {
        return Some(format!(
            "Constraint violated: Property \"{}\" not in input",
            field.name
        ));
    };

    let valid = match &field.kind {
        FieldKind::Integer { min, max } => integer_value(value)
            .is_some_and(|number| number >= *min && max.is_none_or(|max| number <= max)),
        FieldKind::String { min_len, max_len } => scalar_text(value)
            .map(|text| text.chars().count())
            .is_some_and(|len| len >= *min_len && len <= *max_len),
        FieldKind::Timestamp => value.as_str().is_some_and(is_iso8601),
        FieldKind::StringList { max_items } => value.as_array().is_some_and(|items| {
            items.len() <= *max_items
                && items.iter().all(|item| item.is_null() || item.is_string())
        }),
    };

    (!valid).then(|| field.message.clone())
}

/// Integer reading of a field value: JSON integers, integral floats, and
/// strings that parse as integers.
pub fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.parse::<i64>().ok(),
        _ => None,
    }
}

/// Text reading of a scalar field value; lists, objects and null have none.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Strict ISO-8601: RFC 3339 date-times, bare dates, or local date-times.
/// Date and time must be joined by `T`.
pub fn is_iso8601(text: &str) -> bool {
    if text.as_bytes().get(10).is_some_and(|separator| *separator != b'T') {
        return false;
    }
    DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_iso8601_forms() {
        assert!(is_iso8601("2020-12-31T23:59:59Z"));
        assert!(is_iso8601("2020-12-31T23:59:59.250+02:00"));
        assert!(is_iso8601("2020-12-31"));
        assert!(is_iso8601("2020-12-31T23:59:59"));
    }

    #[test]
    fn rejects_loose_timestamps() {
        assert!(!is_iso8601("2020-02-30"));
        assert!(!is_iso8601("31/12/2020"));
        assert!(!is_iso8601("2020-12-31 23:59"));
        assert!(!is_iso8601("2020-12-31 23:59:59Z"));
        assert!(!is_iso8601("2020-12-31t23:59:59Z"));
        assert!(!is_iso8601("2020-12-31 23:59:59"));
        assert!(!is_iso8601(""));
    }

    #[test]
    fn integers_accept_numeric_strings_only() {
        assert_eq!(integer_value(&Value::from(7)), Some(7));
        assert_eq!(integer_value(&Value::from(7.0)), Some(7));
        assert_eq!(integer_value(&Value::from("42")), Some(42));
        assert_eq!(integer_value(&Value::from("4.2")), None);
        assert_eq!(integer_value(&Value::from(4.2)), None);
        assert_eq!(integer_value(&Value::from(true)), None);
    }
}
