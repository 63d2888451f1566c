//! Filtering, sorting, pagination and token search shared by all adapters.

use crate::model::minion::{Minion, MinionStatus};
use std::cmp::Ordering;

/// Sortable minion attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    /// Case-insensitive.
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Query options for `StorageAdapter::list`.
///
/// Sorting runs before pagination; `offset` is applied before `limit`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageFilter {
    pub minion_type_id: Option<String>,
    pub status: Option<MinionStatus>,
    pub include_deleted: bool,
    /// Every listed tag must be present. Empty means no tag filter.
    pub tags: Vec<String>,
    pub sort_by: Option<SortField>,
    pub sort_order: SortOrder,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl StorageFilter {
    pub fn of_type(minion_type_id: impl Into<String>) -> Self {
        Self {
            minion_type_id: Some(minion_type_id.into()),
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = Some(field);
        self.sort_order = order;
        self
    }

    fn matches(&self, minion: &Minion) -> bool {
        if !self.include_deleted && minion.is_deleted() {
            return false;
        }
        if let Some(type_id) = &self.minion_type_id {
            if &minion.minion_type_id != type_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if minion.status != Some(status) {
                return false;
            }
        }
        self.tags.iter().all(|tag| {
            minion
                .tags
                .as_ref()
                .is_some_and(|tags| tags.iter().any(|candidate| candidate == tag))
        })
    }
}

/// Applies `filter` to `minions` and returns owned copies.
pub fn apply_filter<'a, I>(minions: I, filter: &StorageFilter) -> Vec<Minion>
where
    I: IntoIterator<Item = &'a Minion>,
{
    let mut result: Vec<Minion> = minions
        .into_iter()
        .filter(|minion| filter.matches(minion))
        .cloned()
        .collect();

    if let Some(field) = filter.sort_by {
        result.sort_by(|a, b| {
            let ordering = compare_by(a, b, field);
            match filter.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    let limit = filter.limit.unwrap_or(usize::MAX);
    result.into_iter().skip(filter.offset).take(limit).collect()
}

/// Token search over non-deleted minions.
///
/// A blank query behaves like `apply_filter` with the default filter.
pub fn search_minions<'a, I>(minions: I, query: &str) -> Vec<Minion>
where
    I: IntoIterator<Item = &'a Minion>,
{
    let query = query.to_lowercase();
    let tokens: Vec<&str> = query.split_whitespace().collect();
    if tokens.is_empty() {
        return apply_filter(minions, &StorageFilter::default());
    }

    minions
        .into_iter()
        .filter(|minion| !minion.is_deleted())
        .filter(|minion| {
            let text = minion.search_text().to_lowercase();
            tokens.iter().all(|token| text.contains(token))
        })
        .cloned()
        .collect()
}

fn compare_by(a: &Minion, b: &Minion, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    }
}
