//! Field validation engine.
//!
//! # Responsibility
//! - Check a field value map against a schema and report structured errors.
//!
//! # Invariants
//! - Validation never fails as an `Err`; problems are returned as data.
//! - A required field that is absent yields exactly one error.
//! - Keys present in the map but undeclared in the schema are ignored.

use crate::model::field::{FieldDefinition, FieldType, FieldValidation};
use crate::model::minion::FieldMap;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/?#]+").expect("valid url regex"));

const LOCAL_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// One field-level validation problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    /// Offending value (or element, for per-element checks).
    pub value: Option<Value>,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>, value: Option<&Value>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            value: value.cloned(),
        }
    }
}

/// Aggregated validation outcome for one field map.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Errors reported for one field, in check order.
    pub fn errors_for(&self, field: &str) -> Vec<&ValidationError> {
        self.errors.iter().filter(|err| err.field == field).collect()
    }
}

/// Returns whether a value counts as absent (missing, `null`, or `""`).
pub fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// Validates one value against its field definition.
pub fn validate_field(value: Option<&Value>, def: &FieldDefinition) -> Vec<ValidationError> {
    if is_absent(value) {
        if def.required {
            return vec![ValidationError::new(
                &def.name,
                format!("Field \"{}\" is required", def.name),
                value,
            )];
        }
        return Vec::new();
    }

    match value {
        Some(present) => validate_type(present, def),
        None => Vec::new(),
    }
}

/// Validates every schema field against the supplied map.
pub fn validate_fields(fields: &FieldMap, schema: &[FieldDefinition]) -> ValidationResult {
    let errors = schema
        .iter()
        .flat_map(|def| validate_field(fields.get(def.name.as_str()), def))
        .collect();
    ValidationResult::from_errors(errors)
}

fn validate_type(value: &Value, def: &FieldDefinition) -> Vec<ValidationError> {
    let name = def.name.as_str();
    let mut errors = Vec::new();

    match def.field_type {
        FieldType::String | FieldType::Textarea => match value.as_str() {
            Some(text) => apply_string_constraints(text, value, def, &mut errors),
            None => errors.push(expected(name, "string", value)),
        },
        FieldType::Number => match value.as_f64().filter(|number| number.is_finite()) {
            Some(number) => apply_number_constraints(number, value, def, &mut errors),
            None => errors.push(expected(name, "number", value)),
        },
        FieldType::Boolean => {
            if !value.is_boolean() {
                errors.push(expected(name, "boolean", value));
            }
        }
        FieldType::Date => {
            if !value.as_str().is_some_and(is_calendar_date) {
                errors.push(ValidationError::new(
                    name,
                    "Expected valid ISO 8601 date string",
                    Some(value),
                ));
            }
        }
        FieldType::Select => match value.as_str() {
            Some(text) => {
                if let Some(options) = &def.options {
                    if !options.iter().any(|option| option == text) {
                        errors.push(ValidationError::new(
                            name,
                            format!("Value must be one of: {}", options.join(", ")),
                            Some(value),
                        ));
                    }
                }
            }
            None => errors.push(expected(name, "string for select", value)),
        },
        FieldType::MultiSelect => match value.as_array() {
            Some(items) => {
                if let Some(options) = &def.options {
                    for item in items {
                        let known = item
                            .as_str()
                            .is_some_and(|text| options.iter().any(|option| option == text));
                        if !known {
                            errors.push(ValidationError::new(
                                name,
                                format!(
                                    "Invalid option: {}. Must be one of: {}",
                                    display_scalar(item),
                                    options.join(", ")
                                ),
                                Some(item),
                            ));
                        }
                    }
                }
            }
            None => errors.push(expected(name, "array for multi-select", value)),
        },
        FieldType::Tags => match value.as_array() {
            Some(items) => {
                for item in items.iter().filter(|item| !item.is_string()) {
                    errors.push(ValidationError::new(
                        name,
                        "Tag values must be strings",
                        Some(item),
                    ));
                }
            }
            None => errors.push(expected(name, "array for tags", value)),
        },
        FieldType::Array => {
            if !value.is_array() {
                errors.push(expected(name, "array", value));
            }
        }
        FieldType::Url => {
            if !value.as_str().is_some_and(|text| URL_RE.is_match(text)) {
                errors.push(ValidationError::new(
                    name,
                    "Expected valid URL (http/https)",
                    Some(value),
                ));
            }
        }
        FieldType::Email => {
            if !value.as_str().is_some_and(|text| EMAIL_RE.is_match(text)) {
                errors.push(ValidationError::new(
                    name,
                    "Expected valid email address",
                    Some(value),
                ));
            }
        }
        FieldType::Json => {
            if value.is_null() {
                errors.push(ValidationError::new(
                    name,
                    "Expected valid JSON value",
                    Some(value),
                ));
            }
        }
    }

    errors
}

fn apply_string_constraints(
    text: &str,
    value: &Value,
    def: &FieldDefinition,
    errors: &mut Vec<ValidationError>,
) {
    let Some(FieldValidation {
        min_length,
        max_length,
        pattern,
        ..
    }) = &def.validation
    else {
        return;
    };

    let length = text.chars().count();
    if let Some(min_length) = min_length {
        if length < *min_length {
            errors.push(ValidationError::new(
                &def.name,
                format!("Must be at least {min_length} characters"),
                Some(value),
            ));
        }
    }
    if let Some(max_length) = max_length {
        if length > *max_length {
            errors.push(ValidationError::new(
                &def.name,
                format!("Must be at most {max_length} characters"),
                Some(value),
            ));
        }
    }
    if let Some(pattern) = pattern {
        match Regex::new(pattern) {
            Ok(re) if re.is_match(text) => {}
            Ok(_) => errors.push(ValidationError::new(
                &def.name,
                format!("Must match pattern: {pattern}"),
                Some(value),
            )),
            Err(err) => errors.push(ValidationError::new(
                &def.name,
                format!("Invalid pattern `{pattern}`: {err}"),
                Some(value),
            )),
        }
    }
}

fn apply_number_constraints(
    number: f64,
    value: &Value,
    def: &FieldDefinition,
    errors: &mut Vec<ValidationError>,
) {
    let Some(validation) = &def.validation else {
        return;
    };
    if let Some(min) = validation.min {
        if number < min {
            errors.push(ValidationError::new(
                &def.name,
                format!("Value must be >= {min}"),
                Some(value),
            ));
        }
    }
    if let Some(max) = validation.max {
        if number > max {
            errors.push(ValidationError::new(
                &def.name,
                format!("Value must be <= {max}"),
                Some(value),
            ));
        }
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps with offset, and local
/// `YYYY-MM-DDTHH:MM[:SS[.fff]]` with `T` or a space between date and time.
/// Bare years are rejected.
fn is_calendar_date(text: &str) -> bool {
    if DateTime::parse_from_rfc3339(text).is_ok() {
        return true;
    }
    if NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() {
        return true;
    }
    LOCAL_DATETIME_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok())
}

fn expected(field: &str, what: &str, value: &Value) -> ValidationError {
    ValidationError::new(
        field,
        format!("Expected {what}, got {}", json_type_name(value)),
        Some(value),
    )
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::is_calendar_date;

    #[test]
    fn calendar_date_accepts_date_only_and_offsets() {
        assert!(is_calendar_date("2024-02-29"));
        assert!(is_calendar_date("2024-01-15T10:30:00Z"));
        assert!(is_calendar_date("2024-01-15T10:30:00.123+02:00"));
        assert!(is_calendar_date("2024-01-15T10:30"));
    }

    #[test]
    fn calendar_date_rejects_years_and_tokens() {
        assert!(!is_calendar_date("2024"));
        assert!(!is_calendar_date("tomorrow"));
        assert!(!is_calendar_date("2023-02-30"));
        assert!(!is_calendar_date(""));
    }
}
