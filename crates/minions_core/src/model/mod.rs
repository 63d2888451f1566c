//! Structured object domain model.
//!
//! # Responsibility
//! - Define the canonical records shared by validation, lifecycle, relation
//!   and storage layers.
//! - Keep wire naming (camelCase JSON) stable for on-disk interoperability.
//!
//! # Invariants
//! - Every `Minion` is identified by a stable UUIDv4 `MinionId`.
//! - Deletion in memory is a soft-delete marker (`deleted_at`), never removal.
//! - Timestamps are ISO-8601 UTC strings with millisecond precision.

pub mod field;
pub mod minion;
pub mod minion_type;
pub mod relation;

use chrono::{SecondsFormat, Utc};

/// Returns the current instant as an ISO-8601 UTC timestamp.
///
/// Format: `YYYY-MM-DDTHH:MM:SS.mmmZ`, lexicographically sortable.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
