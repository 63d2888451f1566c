//! Field schema definitions.
//!
//! # Responsibility
//! - Describe one typed entry of a `MinionType` schema.
//! - Carry declarative constraints consumed by the validation engine.
//!
//! # Invariants
//! - `FieldType` is a closed set; unknown type names fail deserialization.
//! - `name` is unique within one schema (enforced at registry level).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported data types of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    String,
    Textarea,
    Number,
    Boolean,
    Date,
    Select,
    MultiSelect,
    Url,
    Email,
    Tags,
    Json,
    Array,
}

impl FieldType {
    /// Stable wire name used in type definition documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Select => "select",
            Self::MultiSelect => "multi-select",
            Self::Url => "url",
            Self::Email => "email",
            Self::Tags => "tags",
            Self::Json => "json",
            Self::Array => "array",
        }
    }

    /// Whether values of this type contribute to searchable text.
    pub fn is_searchable(self) -> bool {
        matches!(
            self,
            Self::String | Self::Textarea | Self::Url | Self::Email | Self::Tags | Self::Select
        )
    }
}

/// Declarative constraints applied on top of the type check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regular expression the whole value must match somewhere (unanchored).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// One schema entry of a `MinionType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Key used in `Minion::fields`.
    pub name: String,
    /// Serialized as `type` to match type definition documents.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Allowed values for `select` / `multi-select`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
}

impl FieldDefinition {
    /// Creates an optional field without constraints.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            label: None,
            description: None,
            required: false,
            default_value: None,
            options: None,
            validation: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validation = Some(validation);
        self
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
