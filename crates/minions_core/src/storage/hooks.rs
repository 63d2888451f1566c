//! Before/after hooks around any storage adapter.
//!
//! # Responsibility
//! - Let callers observe adapter calls and rewrite minions before `set`.
//!
//! # Invariants
//! - The wrapped adapter's results are returned unchanged.
//! - `after_*` hooks fire only when the wrapped call succeeded.

use super::{AttachmentStorage, StorageAdapter, StorageFilter, StorageResult};
use crate::model::minion::{Minion, MinionId};

/// Callbacks fired around adapter calls. Every method defaults to a no-op.
pub trait StorageHooks {
    fn before_get(&self, _id: MinionId) {}
    fn after_get(&self, _id: MinionId, _result: Option<&Minion>) {}

    /// Returning `Some` stores the replacement instead of the original.
    fn before_set(&self, _minion: &Minion) -> Option<Minion> {
        None
    }
    fn after_set(&self, _minion: &Minion) {}

    fn before_delete(&self, _id: MinionId) {}
    fn after_delete(&self, _id: MinionId) {}

    fn before_list(&self, _filter: &StorageFilter) {}
    fn after_list(&self, _results: &[Minion], _filter: &StorageFilter) {}

    fn before_search(&self, _query: &str) {}
    fn after_search(&self, _results: &[Minion], _query: &str) {}
}

/// Adapter decorator that runs `H` around every call on `S`.
#[derive(Debug, Clone)]
pub struct HookedStorage<S, H> {
    inner: S,
    hooks: H,
}

impl<S, H> HookedStorage<S, H> {
    pub fn new(inner: S, hooks: H) -> Self {
        Self { inner, hooks }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

/// Wraps `inner` so `hooks` observe each call.
pub fn with_hooks<S: StorageAdapter, H: StorageHooks>(inner: S, hooks: H) -> HookedStorage<S, H> {
    HookedStorage::new(inner, hooks)
}

impl<S: StorageAdapter, H: StorageHooks> StorageAdapter for HookedStorage<S, H> {
    fn get(&self, id: MinionId) -> StorageResult<Option<Minion>> {
        self.hooks.before_get(id);
        let result = self.inner.get(id)?;
        self.hooks.after_get(id, result.as_ref());
        Ok(result)
    }

    fn set(&mut self, minion: Minion) -> StorageResult<()> {
        let minion = self.hooks.before_set(&minion).unwrap_or(minion);
        self.inner.set(minion.clone())?;
        self.hooks.after_set(&minion);
        Ok(())
    }

    fn delete(&mut self, id: MinionId) -> StorageResult<()> {
        self.hooks.before_delete(id);
        self.inner.delete(id)?;
        self.hooks.after_delete(id);
        Ok(())
    }

    fn list(&self, filter: &StorageFilter) -> StorageResult<Vec<Minion>> {
        self.hooks.before_list(filter);
        let results = self.inner.list(filter)?;
        self.hooks.after_list(&results, filter);
        Ok(results)
    }

    fn search(&self, query: &str) -> StorageResult<Vec<Minion>> {
        self.hooks.before_search(query);
        let results = self.inner.search(query)?;
        self.hooks.after_search(&results, query);
        Ok(results)
    }
}

impl<S: AttachmentStorage, H: StorageHooks> AttachmentStorage for HookedStorage<S, H> {
    fn put_file(&mut self, id: MinionId, name: &str, data: &[u8]) -> StorageResult<()> {
        self.inner.put_file(id, name, data)
    }

    fn get_file(&self, id: MinionId, name: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get_file(id, name)
    }

    fn delete_file(&mut self, id: MinionId, name: &str) -> StorageResult<()> {
        self.inner.delete_file(id, name)
    }

    fn list_files(&self, id: MinionId) -> StorageResult<Vec<String>> {
        self.inner.list_files(id)
    }
}
