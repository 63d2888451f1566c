//! Minion persistence boundary.
//!
//! # Responsibility
//! - Define the adapter contract every backend satisfies.
//! - Define the optional attachment capability for per-minion files.
//! - Share filtering, sorting and search semantics across backends.
//!
//! # Invariants
//! - `get` of a missing id is `Ok(None)`; `delete` of a missing id is `Ok(())`.
//! - `list` hides soft-deleted minions unless `include_deleted` is set.
//! - `search` never returns soft-deleted minions.
//! - Mutations take `&mut self`: one writer per adapter instance.

pub mod file;
pub mod filter;
pub mod format;
pub mod hooks;
pub mod memory;

use crate::model::minion::{Minion, MinionId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub use filter::{apply_filter, search_minions, SortField, SortOrder, StorageFilter};

pub type StorageResult<T> = Result<T, StorageError>;

/// Primary record file names; never usable as attachment names.
const RESERVED_ATTACHMENT_NAMES: &[&str] = &["minion.json", "minion.yaml", "minion.yml"];
const TMP_SUFFIX: &str = ".tmp";

/// Storage failures.
#[derive(Debug)]
pub enum StorageError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Encode {
        id: MinionId,
        message: String,
    },
    Decode {
        path: PathBuf,
        message: String,
    },
    /// Attachment call on a minion the adapter does not hold.
    NotFound(MinionId),
    InvalidAttachmentName(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error at {}: {source}", path.display()),
            Self::Encode { id, message } => write!(f, "failed to encode minion {id}: {message}"),
            Self::Decode { path, message } => {
                write!(f, "failed to decode record {}: {message}", path.display())
            }
            Self::NotFound(id) => write!(f, "minion not found: {id}"),
            Self::InvalidAttachmentName(name) => write!(f, "invalid attachment name: `{name}`"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Encode { .. }
            | Self::Decode { .. }
            | Self::NotFound(_)
            | Self::InvalidAttachmentName(_) => None,
        }
    }
}

/// Contract every minion storage backend satisfies.
pub trait StorageAdapter {
    fn get(&self, id: MinionId) -> StorageResult<Option<Minion>>;
    /// Inserts or overwrites the minion with the same id.
    fn set(&mut self, minion: Minion) -> StorageResult<()>;
    fn delete(&mut self, id: MinionId) -> StorageResult<()>;
    fn list(&self, filter: &StorageFilter) -> StorageResult<Vec<Minion>>;
    /// Case-insensitive token search; every token must match.
    fn search(&self, query: &str) -> StorageResult<Vec<Minion>>;
}

/// Optional capability: raw files attached to a stored minion.
pub trait AttachmentStorage: StorageAdapter {
    /// Fails with `NotFound` when the minion is not stored.
    fn put_file(&mut self, id: MinionId, name: &str, data: &[u8]) -> StorageResult<()>;
    fn get_file(&self, id: MinionId, name: &str) -> StorageResult<Option<Vec<u8>>>;
    fn delete_file(&mut self, id: MinionId, name: &str) -> StorageResult<()>;
    /// Attachment names in ascending order.
    fn list_files(&self, id: MinionId) -> StorageResult<Vec<String>>;
}

impl<S: StorageAdapter + ?Sized> StorageAdapter for Box<S> {
    fn get(&self, id: MinionId) -> StorageResult<Option<Minion>> {
        (**self).get(id)
    }

    fn set(&mut self, minion: Minion) -> StorageResult<()> {
        (**self).set(minion)
    }

    fn delete(&mut self, id: MinionId) -> StorageResult<()> {
        (**self).delete(id)
    }

    fn list(&self, filter: &StorageFilter) -> StorageResult<Vec<Minion>> {
        (**self).list(filter)
    }

    fn search(&self, query: &str) -> StorageResult<Vec<Minion>> {
        (**self).search(query)
    }
}

/// Rejects names that are not a single plain file name.
pub fn validate_attachment_name(name: &str) -> StorageResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.ends_with(TMP_SUFFIX)
        || RESERVED_ATTACHMENT_NAMES.contains(&name);
    if invalid {
        return Err(StorageError::InvalidAttachmentName(name.to_string()));
    }
    Ok(())
}
