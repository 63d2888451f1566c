//! MinionType schema model.
//!
//! # Responsibility
//! - Name a schema (ordered field definitions) that minions validate against.
//! - Carry display and organizational metadata for outer layers.
//!
//! # Invariants
//! - `id` and `slug` are unique within one `TypeRegistry`.
//! - A type referenced by persisted minions changes only through schema
//!   evolution (`crate::evolution`).

use crate::model::field::FieldDefinition;
use serde::{Deserialize, Serialize};

/// Named schema definition for a kind of minion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinionType {
    /// Stable identifier, e.g. `builtin-note`.
    pub id: String,
    pub name: String,
    /// URL-safe unique slug, e.g. `prompt-template`.
    pub slug: String,
    /// Ordered field definitions.
    #[serde(default)]
    pub schema: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_system: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_organizational: Option<bool>,
    /// Type ids allowed as `parent_of` children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_child_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behaviors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_views: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl MinionType {
    /// Creates a type with the given identity and schema; metadata is unset.
    pub fn new(
        id: impl Into<String>,
        slug: impl Into<String>,
        name: impl Into<String>,
        schema: Vec<FieldDefinition>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: slug.into(),
            schema,
            description: None,
            icon: None,
            color: None,
            is_system: None,
            is_organizational: None,
            allowed_child_types: None,
            behaviors: None,
            default_view: None,
            available_views: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Looks up one field definition by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.schema.iter().find(|def| def.name == name)
    }
}
