//! Relation (typed directed edge) model.
//!
//! Relations are owned by `crate::relations::RelationGraph`; minions never
//! hold their own edges.

use crate::model::minion::MinionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Stable identifier of a relation.
pub type RelationId = Uuid;

/// Semantic type of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    ParentOf,
    DependsOn,
    Implements,
    RelatesTo,
    InspiredBy,
    Triggers,
    References,
    Blocks,
    AlternativeTo,
    PartOf,
    Follows,
    IntegrationLink,
}

impl RelationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParentOf => "parent_of",
            Self::DependsOn => "depends_on",
            Self::Implements => "implements",
            Self::RelatesTo => "relates_to",
            Self::InspiredBy => "inspired_by",
            Self::Triggers => "triggers",
            Self::References => "references",
            Self::Blocks => "blocks",
            Self::AlternativeTo => "alternative_to",
            Self::PartOf => "part_of",
            Self::Follows => "follows",
            Self::IntegrationLink => "integration_link",
        }
    }
}

/// Directed link between two minions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: RelationId,
    pub source_id: MinionId,
    pub target_id: MinionId,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// Input for adding a relation; id and timestamp are generated.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRelationInput {
    pub source_id: MinionId,
    pub target_id: MinionId,
    pub relation_type: RelationType,
    pub metadata: Option<Value>,
    pub created_by: Option<String>,
}

impl CreateRelationInput {
    pub fn new(source_id: MinionId, target_id: MinionId, relation_type: RelationType) -> Self {
        Self {
            source_id,
            target_id,
            relation_type,
            metadata: None,
            created_by: None,
        }
    }
}
