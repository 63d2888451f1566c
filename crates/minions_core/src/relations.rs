//! In-memory relation graph.
//!
//! # Responsibility
//! - Own typed directed edges between minion ids.
//! - Answer source/target, tree and network queries without scanning.
//!
//! # Invariants
//! - `by_source` and `by_target` reference exactly the relations in
//!   `relations`; every mutation updates all three maps.
//! - Query results follow insertion order.
//! - Traversals are cycle-safe.

use crate::model::minion::MinionId;
use crate::model::now_iso8601;
use crate::model::relation::{CreateRelationInput, Relation, RelationId, RelationType};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use uuid::Uuid;

/// Insertion sequence paired with relation id; orders index sets.
type IndexKey = (u64, RelationId);

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    relation: Relation,
}

/// Relation store keyed by relation id with by-source/by-target indices.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    relations: HashMap<RelationId, Entry>,
    order: BTreeMap<u64, RelationId>,
    by_source: HashMap<MinionId, BTreeSet<IndexKey>>,
    by_target: HashMap<MinionId, BTreeSet<IndexKey>>,
    next_seq: u64,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one relation with a generated id and timestamp.
    pub fn add(&mut self, input: CreateRelationInput) -> Relation {
        let relation = Relation {
            id: Uuid::new_v4(),
            source_id: input.source_id,
            target_id: input.target_id,
            relation_type: input.relation_type,
            created_at: now_iso8601(),
            metadata: input.metadata,
            created_by: input.created_by,
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        let key = (seq, relation.id);
        self.by_source
            .entry(relation.source_id)
            .or_default()
            .insert(key);
        self.by_target
            .entry(relation.target_id)
            .or_default()
            .insert(key);
        self.order.insert(seq, relation.id);
        self.relations.insert(
            relation.id,
            Entry {
                seq,
                relation: relation.clone(),
            },
        );

        debug!(
            "event=relation_add module=relations status=ok relation_type={}",
            relation.relation_type.as_str()
        );
        relation
    }

    /// Removes one relation by id. Returns whether it existed.
    pub fn remove(&mut self, id: RelationId) -> bool {
        let Some(entry) = self.relations.remove(&id) else {
            return false;
        };
        let key = (entry.seq, id);
        self.order.remove(&entry.seq);
        unindex(&mut self.by_source, entry.relation.source_id, &key);
        unindex(&mut self.by_target, entry.relation.target_id, &key);
        true
    }

    /// Removes every relation touching `minion_id` as source or target.
    ///
    /// Returns the number of removed relations.
    pub fn remove_by_minion_id(&mut self, minion_id: MinionId) -> usize {
        let mut doomed = BTreeSet::new();
        for index in [&self.by_source, &self.by_target] {
            if let Some(keys) = index.get(&minion_id) {
                doomed.extend(keys.iter().map(|(_, id)| *id));
            }
        }

        let removed = doomed.into_iter().filter(|id| self.remove(*id)).count();
        debug!("event=relation_remove_by_minion module=relations status=ok removed={removed}");
        removed
    }

    pub fn get(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(&id).map(|entry| &entry.relation)
    }

    /// All relations in insertion order.
    pub fn list(&self) -> Vec<&Relation> {
        self.order
            .values()
            .filter_map(|id| self.get(*id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Relations whose source is `source_id`, optionally of one type.
    pub fn get_from_source(
        &self,
        source_id: MinionId,
        relation_type: Option<RelationType>,
    ) -> Vec<&Relation> {
        self.lookup(&self.by_source, source_id, relation_type)
    }

    /// Relations whose target is `target_id`, optionally of one type.
    pub fn get_to_target(
        &self,
        target_id: MinionId,
        relation_type: Option<RelationType>,
    ) -> Vec<&Relation> {
        self.lookup(&self.by_target, target_id, relation_type)
    }

    /// Targets of `parent_of` relations from `parent_id`.
    pub fn get_children(&self, parent_id: MinionId) -> Vec<MinionId> {
        self.get_from_source(parent_id, Some(RelationType::ParentOf))
            .into_iter()
            .map(|relation| relation.target_id)
            .collect()
    }

    /// Sources of `parent_of` relations to `child_id`.
    pub fn get_parents(&self, child_id: MinionId) -> Vec<MinionId> {
        self.get_to_target(child_id, Some(RelationType::ParentOf))
            .into_iter()
            .map(|relation| relation.source_id)
            .collect()
    }

    /// Depth-first (pre-order) flatten of all `parent_of` descendants.
    ///
    /// Each descendant is reported once; the root itself is never reported,
    /// even when a cycle leads back to it.
    pub fn get_tree(&self, root_id: MinionId) -> Vec<MinionId> {
        let mut result = Vec::new();
        let mut visited = HashSet::from([root_id]);
        let mut stack: Vec<MinionId> = self.get_children(root_id).into_iter().rev().collect();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            result.push(current);
            stack.extend(
                self.get_children(current)
                    .into_iter()
                    .rev()
                    .filter(|child| !visited.contains(child)),
            );
        }

        result
    }

    /// Minions one hop away over any relation type, in either direction.
    pub fn get_network(&self, minion_id: MinionId) -> Vec<MinionId> {
        let mut neighbours: Vec<(u64, MinionId)> = Vec::new();
        if let Some(keys) = self.by_source.get(&minion_id) {
            neighbours.extend(
                keys.iter()
                    .filter_map(|(seq, id)| self.get(*id).map(|rel| (*seq, rel.target_id))),
            );
        }
        if let Some(keys) = self.by_target.get(&minion_id) {
            neighbours.extend(
                keys.iter()
                    .filter_map(|(seq, id)| self.get(*id).map(|rel| (*seq, rel.source_id))),
            );
        }
        neighbours.sort_by_key(|(seq, _)| *seq);

        let mut seen = HashSet::new();
        neighbours
            .into_iter()
            .filter_map(|(_, id)| seen.insert(id).then_some(id))
            .collect()
    }

    fn lookup(
        &self,
        index: &HashMap<MinionId, BTreeSet<IndexKey>>,
        minion_id: MinionId,
        relation_type: Option<RelationType>,
    ) -> Vec<&Relation> {
        let Some(keys) = index.get(&minion_id) else {
            return Vec::new();
        };
        keys.iter()
            .filter_map(|(_, id)| self.get(*id))
            .filter(|relation| relation_type.map_or(true, |kind| relation.relation_type == kind))
            .collect()
    }
}

fn unindex(
    index: &mut HashMap<MinionId, BTreeSet<IndexKey>>,
    minion_id: MinionId,
    key: &IndexKey,
) {
    if let Some(keys) = index.get_mut(&minion_id) {
        keys.remove(key);
        if keys.is_empty() {
            index.remove(&minion_id);
        }
    }
}
