//! Core of the Minions structured-object system.
//!
//! Typed, schema-validated objects (`Minion`) governed by named schemas
//! (`MinionType`), with lifecycle transitions, a relation graph, schema
//! evolution and file-backed storage.

pub mod client;
pub mod codec;
pub mod evolution;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod registry;
pub mod relations;
pub mod storage;
pub mod validation;

pub use client::{ClientError, ClientResult, Minions, MinionsBuilder};
pub use evolution::{is_compatible_value, migrate_minion};
pub use lifecycle::{
    compute_searchable_text, create_minion, hard_delete, restore_minion, soft_delete,
    update_minion, LifecycleOutcome,
};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::field::{FieldDefinition, FieldType, FieldValidation};
pub use model::minion::{
    CreateMinionInput, FieldMap, FieldPatch, Minion, MinionId, MinionPriority, MinionStatus,
    UpdateMinionInput,
};
pub use model::minion_type::MinionType;
pub use model::relation::{CreateRelationInput, Relation, RelationId, RelationType};
pub use registry::{RegistryError, TypeRegistry};
pub use relations::RelationGraph;
pub use storage::file::{
    FileLayout, FileStorageAdapter, FileStorageOptions, JsonFileStorageAdapter,
    YamlFileStorageAdapter,
};
pub use storage::hooks::{with_hooks, HookedStorage, StorageHooks};
pub use storage::memory::MemoryStorageAdapter;
pub use storage::{
    AttachmentStorage, SortField, SortOrder, StorageAdapter, StorageError, StorageFilter,
    StorageResult,
};
pub use validation::{validate_field, validate_fields, ValidationError, ValidationResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
