//! Minion domain model.
//!
//! # Responsibility
//! - Define the canonical structured object record and its input shapes.
//! - Provide soft-delete state helpers.
//!
//! # Invariants
//! - `id` is stable and never reused for another minion.
//! - `deleted_at` is the source of truth for tombstone state; `deleted_at` and
//!   `deleted_by` are both `None` while active.
//! - `searchable_text` is derived data, recomputed on every create/update.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Stable identifier of a minion.
pub type MinionId = Uuid;

/// Dynamic field values keyed by schema field name.
pub type FieldMap = BTreeMap<String, Value>;

/// Partial field update. `None` removes the key from the merged result.
pub type FieldPatch = BTreeMap<String, Option<Value>>;

/// Lifecycle status of a minion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinionStatus {
    Active,
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

impl MinionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Priority level of a minion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinionPriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Canonical structured object instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Minion {
    pub id: MinionId,
    pub title: String,
    /// Foreign key to `MinionType::id`.
    pub minion_type_id: String,
    /// Values validated against the referenced type's schema.
    #[serde(default)]
    pub fields: FieldMap,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MinionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<MinionPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    /// Soft-delete tombstone. Always serialized (`null` while active).
    #[serde(default)]
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub deleted_by: Option<String>,
    /// Lower-cased title + string-like field values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable_text: Option<String>,
    /// Values displaced by schema evolution.
    #[serde(default, rename = "_legacy", skip_serializing_if = "Option::is_none")]
    pub legacy: Option<FieldMap>,
}

impl Minion {
    /// Returns whether this minion carries a soft-delete tombstone.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns whether this minion should be considered visible/active.
    pub fn is_active(&self) -> bool {
        !self.is_deleted()
    }

    /// Text used by token search: precomputed text, or the lower-cased title.
    pub fn search_text(&self) -> String {
        match &self.searchable_text {
            Some(text) => text.clone(),
            None => self.title.to_lowercase(),
        }
    }
}

/// Input for creating a minion; id and timestamps are generated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateMinionInput {
    pub title: String,
    pub fields: FieldMap,
    pub tags: Option<Vec<String>>,
    pub status: Option<MinionStatus>,
    pub priority: Option<MinionPriority>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub category_id: Option<String>,
    pub folder_id: Option<String>,
    pub created_by: Option<String>,
}

impl CreateMinionInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets one field value.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

/// Input for updating a minion. Unset members keep the existing value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateMinionInput {
    pub title: Option<String>,
    /// Merged over existing fields; `None` values remove keys.
    pub fields: Option<FieldPatch>,
    pub tags: Option<Vec<String>>,
    pub status: Option<MinionStatus>,
    pub priority: Option<MinionPriority>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub category_id: Option<String>,
    pub folder_id: Option<String>,
    pub updated_by: Option<String>,
}

impl UpdateMinionInput {
    /// Sets one field value in the patch.
    pub fn set_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields
            .get_or_insert_with(FieldPatch::new)
            .insert(name.into(), Some(value));
        self
    }

    /// Removes one field from the merged result.
    pub fn unset_field(mut self, name: impl Into<String>) -> Self {
        self.fields
            .get_or_insert_with(FieldPatch::new)
            .insert(name.into(), None);
        self
    }
}

/// Generates a fresh minion id.
pub fn generate_id() -> MinionId {
    Uuid::new_v4()
}
