//! Volatile in-process storage backend.

use super::{
    apply_filter, search_minions, validate_attachment_name, AttachmentStorage, StorageAdapter,
    StorageError, StorageFilter, StorageResult,
};
use crate::model::minion::{Minion, MinionId};
use std::collections::BTreeMap;

/// Map-backed adapter with per-minion attachments. Nothing is durable.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageAdapter {
    records: BTreeMap<MinionId, Minion>,
    files: BTreeMap<MinionId, BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorageAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl StorageAdapter for MemoryStorageAdapter {
    fn get(&self, id: MinionId) -> StorageResult<Option<Minion>> {
        Ok(self.records.get(&id).cloned())
    }

    fn set(&mut self, minion: Minion) -> StorageResult<()> {
        self.records.insert(minion.id, minion);
        Ok(())
    }

    fn delete(&mut self, id: MinionId) -> StorageResult<()> {
        self.records.remove(&id);
        self.files.remove(&id);
        Ok(())
    }

    fn list(&self, filter: &StorageFilter) -> StorageResult<Vec<Minion>> {
        Ok(apply_filter(self.records.values(), filter))
    }

    fn search(&self, query: &str) -> StorageResult<Vec<Minion>> {
        Ok(search_minions(self.records.values(), query))
    }
}

impl AttachmentStorage for MemoryStorageAdapter {
    fn put_file(&mut self, id: MinionId, name: &str, data: &[u8]) -> StorageResult<()> {
        validate_attachment_name(name)?;
        if !self.records.contains_key(&id) {
            return Err(StorageError::NotFound(id));
        }
        self.files
            .entry(id)
            .or_default()
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn get_file(&self, id: MinionId, name: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_attachment_name(name)?;
        Ok(self
            .files
            .get(&id)
            .and_then(|files| files.get(name))
            .cloned())
    }

    fn delete_file(&mut self, id: MinionId, name: &str) -> StorageResult<()> {
        validate_attachment_name(name)?;
        if let Some(files) = self.files.get_mut(&id) {
            files.remove(name);
        }
        Ok(())
    }

    fn list_files(&self, id: MinionId) -> StorageResult<Vec<String>> {
        Ok(self
            .files
            .get(&id)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default())
    }
}
