//! Minion lifecycle transitions.
//!
//! # Responsibility
//! - Derive canonical minions from create/update inputs.
//! - Apply soft-delete, restore and hard-delete transitions.
//!
//! # Invariants
//! - Validation is fail-open: an invalid minion is still constructed and
//!   returned next to its `ValidationResult`.
//! - Inputs are never mutated; every transition returns a new value.
//! - `searchable_text` is recomputed on create and update.
//! - Hard delete only touches the relation graph, never storage.

use crate::model::field::FieldType;
use crate::model::minion::{
    generate_id, CreateMinionInput, FieldMap, Minion, MinionStatus, UpdateMinionInput,
};
use crate::model::minion_type::MinionType;
use crate::model::now_iso8601;
use crate::relations::RelationGraph;
use crate::validation::{validate_fields, ValidationResult};
use log::debug;
use serde_json::Value;

/// Minion produced by a create/update transition plus its validation.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleOutcome {
    pub minion: Minion,
    pub validation: ValidationResult,
}

/// Creates a new minion of `minion_type` from `input`.
///
/// Schema defaults fill keys the input leaves out; `status` defaults to
/// `active`.
pub fn create_minion(input: CreateMinionInput, minion_type: &MinionType) -> LifecycleOutcome {
    let fields = apply_defaults(input.fields, minion_type);
    let validation = validate_fields(&fields, &minion_type.schema);
    let timestamp = now_iso8601();

    let mut minion = Minion {
        id: generate_id(),
        title: input.title,
        minion_type_id: minion_type.id.clone(),
        fields,
        created_at: timestamp.clone(),
        updated_at: timestamp,
        tags: input.tags,
        status: Some(input.status.unwrap_or(MinionStatus::Active)),
        priority: input.priority,
        description: input.description,
        due_date: input.due_date,
        category_id: input.category_id,
        folder_id: input.folder_id,
        created_by: input.created_by,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
        searchable_text: None,
        legacy: None,
    };
    minion.searchable_text = Some(compute_searchable_text(&minion, minion_type));

    debug!(
        "event=minion_create module=lifecycle status=ok type_id={} valid={} errors={}",
        minion_type.id,
        validation.valid,
        validation.errors.len()
    );
    LifecycleOutcome { minion, validation }
}

/// Applies `input` over `existing` and revalidates the merged fields.
pub fn update_minion(
    existing: &Minion,
    input: UpdateMinionInput,
    minion_type: &MinionType,
) -> LifecycleOutcome {
    let mut fields = existing.fields.clone();
    for (name, value) in input.fields.unwrap_or_default() {
        match value {
            Some(value) => {
                fields.insert(name, value);
            }
            None => {
                fields.remove(&name);
            }
        }
    }
    let validation = validate_fields(&fields, &minion_type.schema);

    let mut minion = Minion {
        title: input.title.unwrap_or_else(|| existing.title.clone()),
        fields,
        tags: input.tags.or_else(|| existing.tags.clone()),
        status: input.status.or(existing.status),
        priority: input.priority.or(existing.priority),
        description: input.description.or_else(|| existing.description.clone()),
        due_date: input.due_date.or_else(|| existing.due_date.clone()),
        category_id: input.category_id.or_else(|| existing.category_id.clone()),
        folder_id: input.folder_id.or_else(|| existing.folder_id.clone()),
        updated_at: now_iso8601(),
        updated_by: input.updated_by,
        ..existing.clone()
    };
    minion.searchable_text = Some(compute_searchable_text(&minion, minion_type));

    debug!(
        "event=minion_update module=lifecycle status=ok type_id={} valid={} errors={}",
        minion_type.id,
        validation.valid,
        validation.errors.len()
    );
    LifecycleOutcome { minion, validation }
}

/// Marks a minion as deleted without removing it.
pub fn soft_delete(minion: &Minion, deleted_by: Option<&str>) -> Minion {
    let timestamp = now_iso8601();
    Minion {
        deleted_at: Some(timestamp.clone()),
        deleted_by: deleted_by.map(str::to_string),
        updated_at: timestamp,
        ..minion.clone()
    }
}

/// Clears the soft-delete tombstone.
pub fn restore_minion(minion: &Minion) -> Minion {
    Minion {
        deleted_at: None,
        deleted_by: None,
        updated_at: now_iso8601(),
        ..minion.clone()
    }
}

/// Removes every relation touching `minion` and returns how many went away.
///
/// Removing the record itself from storage is the caller's job.
pub fn hard_delete(minion: &Minion, graph: &mut RelationGraph) -> usize {
    let removed = graph.remove_by_minion_id(minion.id);
    debug!("event=minion_hard_delete module=lifecycle status=ok relations_removed={removed}");
    removed
}

/// Lower-cased title plus string-like field values in schema order.
pub fn compute_searchable_text(minion: &Minion, minion_type: &MinionType) -> String {
    let mut parts = vec![minion.title.clone()];

    for def in minion_type
        .schema
        .iter()
        .filter(|def| def.field_type.is_searchable())
    {
        match (def.field_type, minion.fields.get(&def.name)) {
            (FieldType::Tags, Some(Value::Array(items))) => {
                let joined = items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" ");
                if !joined.is_empty() {
                    parts.push(joined);
                }
            }
            (_, Some(Value::String(text))) if !text.is_empty() => parts.push(text.clone()),
            _ => {}
        }
    }

    parts.join(" ").to_lowercase()
}

fn apply_defaults(mut fields: FieldMap, minion_type: &MinionType) -> FieldMap {
    for def in &minion_type.schema {
        if let Some(default) = &def.default_value {
            fields
                .entry(def.name.clone())
                .or_insert_with(|| default.clone());
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::compute_searchable_text;
    use crate::model::field::{FieldDefinition, FieldType};
    use crate::model::minion::CreateMinionInput;
    use crate::model::minion_type::MinionType;
    use serde_json::json;

    #[test]
    fn searchable_text_skips_non_text_fields_and_joins_tags() {
        let minion_type = MinionType::new(
            "t",
            "t",
            "T",
            vec![
                FieldDefinition::new("body", FieldType::Textarea),
                FieldDefinition::new("count", FieldType::Number),
                FieldDefinition::new("labels", FieldType::Tags),
            ],
        );
        let outcome = super::create_minion(
            CreateMinionInput::new("Hello World")
                .with_field("body", json!("Some BODY"))
                .with_field("count", json!(3))
                .with_field("labels", json!(["Red", "blue"])),
            &minion_type,
        );

        assert_eq!(
            compute_searchable_text(&outcome.minion, &minion_type),
            "hello world some body red blue"
        );
    }
}
