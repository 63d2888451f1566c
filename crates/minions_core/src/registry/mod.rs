//! In-process MinionType registry.
//!
//! # Responsibility
//! - Index named schemas by id and by slug.
//! - Reject registrations that would make lookups ambiguous.
//!
//! # Invariants
//! - `id` and `slug` are unique across one registry instance.
//! - A failed `register` leaves the registry unchanged.
//! - No persistence: durable custom types are reloaded by the caller.

pub mod builtin;

use crate::model::minion_type::MinionType;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("valid slug regex"));

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidId(String),
    InvalidSlug(String),
    DuplicateId(String),
    DuplicateSlug(String),
    DuplicateFieldName { type_id: String, field: String },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(value) => write!(f, "type id is invalid: `{value}`"),
            Self::InvalidSlug(value) => write!(f, "type slug is not URL-safe: `{value}`"),
            Self::DuplicateId(value) => write!(f, "type with id `{value}` is already registered"),
            Self::DuplicateSlug(value) => {
                write!(f, "type with slug `{value}` is already registered")
            }
            Self::DuplicateFieldName { type_id, field } => {
                write!(f, "type `{type_id}` declares field `{field}` more than once")
            }
        }
    }
}

impl Error for RegistryError {}

/// Registry of MinionTypes keyed by id, with a slug index.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, MinionType>,
    slug_index: BTreeMap<String, String>,
}

impl TypeRegistry {
    /// Creates a registry pre-loaded with the built-in types.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for minion_type in builtin::builtin_types() {
            if let Err(err) = registry.register(minion_type) {
                warn!("event=registry_builtin module=registry status=error error={err}");
            }
        }
        registry
    }

    /// Creates a registry without built-in types.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers one type.
    ///
    /// # Errors
    /// - `InvalidId` / `InvalidSlug` for blank ids or non URL-safe slugs.
    /// - `DuplicateId` / `DuplicateSlug` when either key is taken.
    /// - `DuplicateFieldName` when the schema repeats a field name.
    pub fn register(&mut self, minion_type: MinionType) -> Result<(), RegistryError> {
        if minion_type.id.trim().is_empty() {
            return Err(RegistryError::InvalidId(minion_type.id));
        }
        if !SLUG_RE.is_match(&minion_type.slug) {
            return Err(RegistryError::InvalidSlug(minion_type.slug));
        }
        if self.types.contains_key(minion_type.id.as_str()) {
            return Err(RegistryError::DuplicateId(minion_type.id));
        }
        if self.slug_index.contains_key(minion_type.slug.as_str()) {
            return Err(RegistryError::DuplicateSlug(minion_type.slug));
        }

        let mut seen = BTreeSet::new();
        for def in &minion_type.schema {
            if !seen.insert(def.name.as_str()) {
                return Err(RegistryError::DuplicateFieldName {
                    type_id: minion_type.id.clone(),
                    field: def.name.clone(),
                });
            }
        }

        debug!(
            "event=type_register module=registry status=ok type_id={} fields={}",
            minion_type.id,
            minion_type.schema.len()
        );
        self.slug_index
            .insert(minion_type.slug.clone(), minion_type.id.clone());
        self.types.insert(minion_type.id.clone(), minion_type);
        Ok(())
    }

    pub fn get_by_id(&self, id: &str) -> Option<&MinionType> {
        self.types.get(id)
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&MinionType> {
        let id = self.slug_index.get(slug)?;
        self.types.get(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Removes one type by id. Returns whether something was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.types.remove(id) {
            Some(removed) => {
                self.slug_index.remove(removed.slug.as_str());
                true
            }
            None => false,
        }
    }

    /// Returns all registered types (id order).
    pub fn list(&self) -> Vec<&MinionType> {
        self.types.values().collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
