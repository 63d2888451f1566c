use minions_core::{CreateRelationInput, MinionId, RelationGraph, RelationType};
use serde_json::json;
use uuid::Uuid;

fn ids<const N: usize>() -> [MinionId; N] {
    std::array::from_fn(|_| Uuid::new_v4())
}

fn parent(graph: &mut RelationGraph, from: MinionId, to: MinionId) {
    graph.add(CreateRelationInput::new(from, to, RelationType::ParentOf));
}

#[test]
fn add_populates_both_indices() {
    let [a, b] = ids::<2>();
    let mut graph = RelationGraph::new();

    let mut input = CreateRelationInput::new(a, b, RelationType::DependsOn);
    input.metadata = Some(json!({"weight": 2}));
    input.created_by = Some("planner".to_string());
    let relation = graph.add(input);

    assert_eq!(graph.get(relation.id), Some(&relation));
    assert_eq!(graph.get_from_source(a, None), vec![&relation]);
    assert_eq!(graph.get_to_target(b, None), vec![&relation]);
    assert!(graph.get_from_source(b, None).is_empty());
    assert_eq!(relation.metadata, Some(json!({"weight": 2})));
    assert_eq!(relation.created_by.as_deref(), Some("planner"));
}

#[test]
fn type_filter_and_insertion_order() {
    let [a, b, c, d] = ids::<4>();
    let mut graph = RelationGraph::new();
    graph.add(CreateRelationInput::new(a, b, RelationType::Blocks));
    graph.add(CreateRelationInput::new(a, c, RelationType::ParentOf));
    graph.add(CreateRelationInput::new(a, d, RelationType::Blocks));

    let blocks: Vec<MinionId> = graph
        .get_from_source(a, Some(RelationType::Blocks))
        .into_iter()
        .map(|rel| rel.target_id)
        .collect();
    assert_eq!(blocks, vec![b, d]);
    assert_eq!(graph.get_from_source(a, None).len(), 3);
    assert_eq!(graph.get_children(a), vec![c]);
    assert_eq!(graph.get_parents(c), vec![a]);
}

#[test]
fn remove_keeps_indices_consistent() {
    let [a, b] = ids::<2>();
    let mut graph = RelationGraph::new();
    let relation = graph.add(CreateRelationInput::new(a, b, RelationType::RelatesTo));

    assert!(graph.remove(relation.id));
    assert!(!graph.remove(relation.id));
    assert!(graph.is_empty());
    assert!(graph.get_from_source(a, None).is_empty());
    assert!(graph.get_to_target(b, None).is_empty());
}

#[test]
fn remove_by_minion_id_counts_both_directions() {
    let [a, b, c] = ids::<3>();
    let mut graph = RelationGraph::new();
    parent(&mut graph, a, b);
    parent(&mut graph, c, a);
    graph.add(CreateRelationInput::new(a, a, RelationType::Follows));
    parent(&mut graph, b, c);

    assert_eq!(graph.remove_by_minion_id(a), 3);
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.get_children(b), vec![c]);
}

#[test]
fn tree_is_depth_first_preorder() {
    let [root, a, b, a1, a2] = ids::<5>();
    let mut graph = RelationGraph::new();
    parent(&mut graph, root, a);
    parent(&mut graph, root, b);
    parent(&mut graph, a, a1);
    parent(&mut graph, a, a2);
    graph.add(CreateRelationInput::new(b, root, RelationType::References));

    assert_eq!(graph.get_tree(root), vec![a, a1, a2, b]);
    assert!(graph.get_tree(a1).is_empty());
}

#[test]
fn tree_survives_cycles_and_shared_children() {
    let [a, b, c] = ids::<3>();
    let mut graph = RelationGraph::new();
    parent(&mut graph, a, b);
    parent(&mut graph, b, c);
    parent(&mut graph, c, a);
    parent(&mut graph, a, c);

    let tree = graph.get_tree(a);
    assert_eq!(tree, vec![b, c]);
}

#[test]
fn network_merges_directions_without_duplicates() {
    let [a, b, c, d] = ids::<4>();
    let mut graph = RelationGraph::new();
    graph.add(CreateRelationInput::new(a, b, RelationType::DependsOn));
    graph.add(CreateRelationInput::new(c, a, RelationType::Blocks));
    graph.add(CreateRelationInput::new(b, a, RelationType::InspiredBy));
    graph.add(CreateRelationInput::new(a, d, RelationType::PartOf));
    graph.add(CreateRelationInput::new(b, c, RelationType::RelatesTo));

    assert_eq!(graph.get_network(a), vec![b, c, d]);
    assert!(graph.get_network(Uuid::new_v4()).is_empty());
}

#[test]
fn relations_serialize_with_wire_names() {
    let [a, b] = ids::<2>();
    let mut graph = RelationGraph::new();
    let relation = graph.add(CreateRelationInput::new(a, b, RelationType::IntegrationLink));

    let value = serde_json::to_value(&relation).unwrap();
    assert_eq!(value["type"], json!("integration_link"));
    assert_eq!(value["sourceId"], json!(a.to_string()));
    assert!(value.get("metadata").is_none());
}
