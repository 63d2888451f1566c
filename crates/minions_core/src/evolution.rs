//! Schema evolution for persisted minions.
//!
//! # Responsibility
//! - Reshape a minion's fields when its type schema changes.
//!
//! # Invariants
//! - No value is dropped: removed or incompatible values move to `_legacy`.
//! - The input minion is never mutated.

use crate::model::field::{FieldDefinition, FieldType};
use crate::model::minion::{FieldMap, Minion};
use crate::model::now_iso8601;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;

/// Migrates `minion` from `old_schema` to `new_schema`.
///
/// - Fields missing from the new schema move to `_legacy`.
/// - Fields whose type changed keep their value only when it is compatible
///   with the new type; otherwise they move to `_legacy`.
/// - New-schema defaults fill keys that end up absent.
///
/// Existing `_legacy` entries are kept; a later migration wins on key
/// collision.
pub fn migrate_minion(
    minion: &Minion,
    old_schema: &[FieldDefinition],
    new_schema: &[FieldDefinition],
) -> Minion {
    let old_defs: HashMap<&str, &FieldDefinition> =
        old_schema.iter().map(|def| (def.name.as_str(), def)).collect();
    let new_defs: HashMap<&str, &FieldDefinition> =
        new_schema.iter().map(|def| (def.name.as_str(), def)).collect();

    let mut fields = FieldMap::new();
    let mut legacy = minion.legacy.clone().unwrap_or_default();

    for (name, value) in &minion.fields {
        let Some(new_def) = new_defs.get(name.as_str()) else {
            legacy.insert(name.clone(), value.clone());
            continue;
        };
        let type_changed = old_defs
            .get(name.as_str())
            .is_some_and(|old_def| old_def.field_type != new_def.field_type);
        if type_changed && !is_compatible_value(value, new_def.field_type) {
            legacy.insert(name.clone(), value.clone());
        } else {
            fields.insert(name.clone(), value.clone());
        }
    }

    for def in new_schema {
        if let Some(default) = &def.default_value {
            fields
                .entry(def.name.clone())
                .or_insert_with(|| default.clone());
        }
    }

    debug!(
        "event=minion_migrate module=evolution status=ok kept={} legacy={}",
        fields.len(),
        legacy.len()
    );

    Minion {
        fields,
        legacy: (!legacy.is_empty()).then_some(legacy),
        updated_at: now_iso8601(),
        ..minion.clone()
    }
}

/// Loose shape check of `value` against a target field type.
///
/// `null` is compatible with everything; `json` accepts anything.
pub fn is_compatible_value(value: &Value, target: FieldType) -> bool {
    if value.is_null() {
        return true;
    }
    match target {
        FieldType::String
        | FieldType::Textarea
        | FieldType::Url
        | FieldType::Email
        | FieldType::Date
        | FieldType::Select => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Tags | FieldType::MultiSelect | FieldType::Array => value.is_array(),
        FieldType::Json => true,
    }
}
