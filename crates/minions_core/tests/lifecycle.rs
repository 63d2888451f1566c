use minions_core::registry::builtin::note_type;
use minions_core::{
    create_minion, hard_delete, restore_minion, soft_delete, update_minion, CreateMinionInput,
    CreateRelationInput, FieldDefinition, FieldType, MinionStatus, MinionType, RelationGraph,
    RelationType, UpdateMinionInput,
};
use serde_json::json;

fn task_like() -> MinionType {
    MinionType::new(
        "custom-ticket",
        "ticket",
        "Ticket",
        vec![
            FieldDefinition::new("summary", FieldType::Textarea).required(),
            FieldDefinition::new("points", FieldType::Number).with_default(json!(1)),
            FieldDefinition::new("labels", FieldType::Tags).with_default(json!([])),
        ],
    )
}

#[test]
fn create_applies_defaults_and_initial_state() {
    let minion_type = task_like();
    let outcome = create_minion(
        CreateMinionInput::new("Fix login").with_field("summary", json!("Session drops")),
        &minion_type,
    );

    assert!(outcome.validation.valid);
    let minion = outcome.minion;
    assert_eq!(minion.minion_type_id, "custom-ticket");
    assert_eq!(minion.fields["points"], json!(1));
    assert_eq!(minion.fields["labels"], json!([]));
    assert_eq!(minion.status, Some(MinionStatus::Active));
    assert_eq!(minion.created_at, minion.updated_at);
    assert!(minion.created_at.ends_with('Z'));
    assert!(minion.deleted_at.is_none());
    assert_eq!(
        minion.searchable_text.as_deref(),
        Some("fix login session drops")
    );
}

#[test]
fn create_keeps_explicit_values_over_defaults() {
    let minion_type = task_like();
    let mut input = CreateMinionInput::new("Ship")
        .with_field("summary", json!("release"))
        .with_field("points", json!(8));
    input.status = Some(MinionStatus::Todo);

    let minion = create_minion(input, &minion_type).minion;
    assert_eq!(minion.fields["points"], json!(8));
    assert_eq!(minion.status, Some(MinionStatus::Todo));
}

#[test]
fn create_is_fail_open() {
    let outcome = create_minion(CreateMinionInput::new("Empty"), &note_type());

    assert!(!outcome.validation.valid);
    assert_eq!(outcome.validation.errors.len(), 1);
    assert_eq!(outcome.validation.errors[0].field, "content");
    assert_eq!(outcome.minion.title, "Empty");
}

#[test]
fn every_create_gets_a_fresh_id() {
    let note = note_type();
    let first = create_minion(CreateMinionInput::new("a"), &note).minion;
    let second = create_minion(CreateMinionInput::new("a"), &note).minion;
    assert_ne!(first.id, second.id);
}

#[test]
fn update_merges_fields_and_keeps_identity() {
    let minion_type = task_like();
    let created = create_minion(
        CreateMinionInput::new("Fix login").with_field("summary", json!("Session drops")),
        &minion_type,
    )
    .minion;

    let update = UpdateMinionInput {
        title: Some("Fix login flow".to_string()),
        updated_by: Some("ops".to_string()),
        ..UpdateMinionInput::default()
    }
    .set_field("points", json!(3))
    .unset_field("labels");

    let outcome = update_minion(&created, update, &minion_type);
    let updated = outcome.minion;

    assert!(outcome.validation.valid);
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.title, "Fix login flow");
    assert_eq!(updated.fields["summary"], json!("Session drops"));
    assert_eq!(updated.fields["points"], json!(3));
    assert!(!updated.fields.contains_key("labels"));
    assert_eq!(updated.updated_by.as_deref(), Some("ops"));
    assert_eq!(
        updated.searchable_text.as_deref(),
        Some("fix login flow session drops")
    );

    // The original value is untouched.
    assert_eq!(created.fields["points"], json!(1));
}

#[test]
fn update_revalidates_merged_fields() {
    let minion_type = task_like();
    let created = create_minion(
        CreateMinionInput::new("t").with_field("summary", json!("s")),
        &minion_type,
    )
    .minion;

    let outcome = update_minion(
        &created,
        UpdateMinionInput::default().unset_field("summary"),
        &minion_type,
    );
    assert!(!outcome.validation.valid);
    assert!(!outcome.minion.fields.contains_key("summary"));
}

#[test]
fn soft_delete_then_restore_round_trips() {
    let created = create_minion(
        CreateMinionInput::new("n").with_field("content", json!("c")),
        &note_type(),
    )
    .minion;

    let deleted = soft_delete(&created, Some("alice"));
    assert!(deleted.is_deleted());
    assert_eq!(deleted.deleted_by.as_deref(), Some("alice"));
    assert_eq!(deleted.updated_at, *deleted.deleted_at.as_ref().unwrap());
    assert!(created.is_active());

    let restored = restore_minion(&deleted);
    assert!(restored.is_active());
    assert!(restored.deleted_by.is_none());
    assert_eq!(restored.fields, created.fields);
    assert_eq!(restored.title, created.title);
    assert_eq!(restored.id, created.id);
}

#[test]
fn hard_delete_removes_only_touching_relations() {
    let note = note_type();
    let a = create_minion(CreateMinionInput::new("a"), &note).minion;
    let b = create_minion(CreateMinionInput::new("b"), &note).minion;
    let c = create_minion(CreateMinionInput::new("c"), &note).minion;

    let mut graph = RelationGraph::new();
    graph.add(CreateRelationInput::new(a.id, b.id, RelationType::ParentOf));
    graph.add(CreateRelationInput::new(c.id, a.id, RelationType::References));
    let kept = graph.add(CreateRelationInput::new(b.id, c.id, RelationType::DependsOn));

    assert_eq!(hard_delete(&a, &mut graph), 2);
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.list()[0].id, kept.id);
    assert!(graph.get_from_source(a.id, None).is_empty());
    assert!(graph.get_to_target(a.id, None).is_empty());
    assert_eq!(hard_delete(&a, &mut graph), 0);
}
