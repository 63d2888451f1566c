use minions_core::client::{from_fn, Operation, OperationArgs, OperationOutput};
use minions_core::{
    with_hooks, ClientError, CreateMinionInput, MemoryStorageAdapter, Minion, Minions,
    RelationType, StorageFilter, StorageHooks, UpdateMinionInput,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Log = Arc<Mutex<Vec<String>>>;

fn note_input(title: &str) -> CreateMinionInput {
    CreateMinionInput::new(title).with_field("content", json!("body"))
}

fn logged(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn handlers_wrap_the_core_in_registration_order() {
    let log: Log = Arc::default();
    let (outer, inner) = (log.clone(), log.clone());

    let mut client = Minions::builder()
        .middleware(from_fn(move |ctx, next| {
            outer.lock().unwrap().push(format!("outer:before:{}", ctx.operation()));
            let result = next.run(ctx);
            let produced = ctx.result.is_some();
            outer.lock().unwrap().push(format!("outer:after:{produced}"));
            result
        }))
        .middleware(from_fn(move |ctx, next| {
            inner.lock().unwrap().push("inner:before".to_string());
            let result = next.run(ctx);
            inner.lock().unwrap().push("inner:after".to_string());
            result
        }))
        .build();

    client.create("note", note_input("Ordered")).unwrap();

    assert_eq!(
        logged(&log),
        vec![
            "outer:before:create",
            "inner:before",
            "inner:after",
            "outer:after:true",
        ]
    );
}

#[test]
fn handlers_can_rewrite_arguments() {
    let mut client = Minions::builder()
        .middleware(from_fn(|ctx, next| {
            if let OperationArgs::Create { input, .. } = &mut ctx.args {
                input.created_by = Some("pipeline".to_string());
                input.tags.get_or_insert_with(Vec::new).push("audited".to_string());
            }
            next.run(ctx)
        }))
        .build();

    let minion = client.create("note", note_input("Rewritten")).unwrap();
    assert_eq!(minion.created_by.as_deref(), Some("pipeline"));
    assert_eq!(minion.tags, Some(vec!["audited".to_string()]));
}

#[test]
fn handlers_can_short_circuit_with_a_result() {
    let cached = Minions::new().create("note", note_input("Cached")).unwrap();
    let served = cached.clone();

    let mut client = Minions::builder()
        .middleware(from_fn(move |ctx, next| match ctx.args {
            OperationArgs::Load { id } if id == served.id => {
                ctx.result = Some(OperationOutput::MaybeMinion(Some(served.clone())));
                Ok(())
            }
            _ => next.run(ctx),
        }))
        .build();

    // No storage configured, yet the handler answers.
    assert_eq!(client.load(cached.id).unwrap(), Some(cached));
    assert!(matches!(
        client.load(Uuid::new_v4()),
        Err(ClientError::StorageNotConfigured {
            operation: Operation::Load
        })
    ));
}

#[test]
fn handlers_can_reject_operations() {
    let mut client = Minions::builder()
        .middleware(from_fn(|ctx, next| {
            if ctx.operation() == Operation::Link {
                return Err(ClientError::Rejected {
                    operation: Operation::Link,
                    reason: "linking is frozen".to_string(),
                });
            }
            next.run(ctx)
        }))
        .build();

    let a = client.create("note", note_input("a")).unwrap();
    let b = client.create("note", note_input("b")).unwrap();
    let err = client.link(a.id, b.id, RelationType::RelatesTo).unwrap_err();

    assert!(matches!(err, ClientError::Rejected { .. }));
    assert_eq!(err.to_string(), "`link` rejected: linking is frozen");
    assert!(client.graph.is_empty());
}

#[test]
fn swallowing_next_without_result_is_reported() {
    let mut client = Minions::builder()
        .middleware(from_fn(|_ctx, _next| Ok(())))
        .build();

    assert!(matches!(
        client.create("note", note_input("lost")),
        Err(ClientError::NoResult {
            operation: Operation::Create
        })
    ));
}

#[test]
fn handlers_share_metadata() {
    let seen: Log = Arc::default();
    let sink = seen.clone();

    let mut client = Minions::builder()
        .middleware(from_fn(|ctx, next| {
            ctx.metadata.insert("requestId".to_string(), json!("req-1"));
            next.run(ctx)
        }))
        .middleware(from_fn(move |ctx, next| {
            if let Some(id) = ctx.metadata.get("requestId").and_then(|v| v.as_str()) {
                sink.lock().unwrap().push(id.to_string());
            }
            next.run(ctx)
        }))
        .build();

    client.create("note", note_input("meta")).unwrap();
    assert_eq!(logged(&seen), vec!["req-1"]);
}

#[test]
fn create_and_update_reject_invalid_fields() {
    let mut client = Minions::new();

    match client.create("note", CreateMinionInput::new("empty")) {
        Err(ClientError::Validation { type_slug, errors }) => {
            assert_eq!(type_slug, "note");
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "content");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let minion = client.create("note", note_input("ok")).unwrap();
    let err = client
        .update(&minion, UpdateMinionInput::default().unset_field("content"))
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation { .. }));

    assert!(matches!(
        client.create("recipe", note_input("x")),
        Err(ClientError::UnknownTypeSlug(slug)) if slug == "recipe"
    ));
}

#[test]
fn lifecycle_operations_run_without_storage() {
    let mut client = Minions::new();
    let parent = client.create("note", note_input("parent")).unwrap();
    let child = client.create("note", note_input("child")).unwrap();
    client
        .link(parent.id, child.id, RelationType::ParentOf)
        .unwrap();
    assert_eq!(client.graph.get_children(parent.id), vec![child.id]);

    let deleted = client.soft_delete(&child, Some("bob")).unwrap();
    assert!(deleted.is_deleted());
    let restored = client.restore(&deleted).unwrap();
    assert!(restored.is_active());

    assert_eq!(client.hard_delete(&child).unwrap(), 1);
    assert!(client.graph.is_empty());

    for result in [
        client.save(&parent).map(|_| ()),
        client.remove(parent.id),
        client.list(StorageFilter::default()).map(|_| ()),
        client.search("parent").map(|_| ()),
    ] {
        assert!(matches!(
            result,
            Err(ClientError::StorageNotConfigured { .. })
        ));
    }
}

struct SetCounter {
    log: Log,
}

impl StorageHooks for SetCounter {
    fn after_set(&self, minion: &Minion) {
        self.log.lock().unwrap().push(format!("saved:{}", minion.title));
    }

    fn before_delete(&self, _id: Uuid) {
        self.log.lock().unwrap().push("deleting".to_string());
    }
}

#[test]
fn storage_operations_go_through_hooked_adapter() {
    let log: Log = Arc::default();
    let storage = with_hooks(MemoryStorageAdapter::new(), SetCounter { log: log.clone() });
    let mut client = Minions::builder().storage(storage).build();
    assert!(client.has_storage());

    let minion = client.create("note", note_input("Stored")).unwrap();
    client.save(&minion).unwrap();
    assert_eq!(client.load(minion.id).unwrap(), Some(minion.clone()));
    assert_eq!(client.search("stored").unwrap().len(), 1);

    client.remove(minion.id).unwrap();
    assert!(client.load(minion.id).unwrap().is_none());
    assert_eq!(logged(&log), vec!["saved:Stored", "deleting"]);
}
