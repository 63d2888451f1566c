//! High-level client facade.
//!
//! # Responsibility
//! - Bundle the type registry, relation graph and an optional storage
//!   backend behind one entry point.
//! - Route every operation through the middleware pipeline.
//!
//! # Invariants
//! - `create`/`update` reject invalid results instead of returning them.
//! - Storage operations fail fast with `StorageNotConfigured` when no
//!   backend was supplied.

pub mod middleware;

use crate::lifecycle::{create_minion, hard_delete, restore_minion, soft_delete, update_minion};
use crate::model::minion::{CreateMinionInput, Minion, MinionId, UpdateMinionInput};
use crate::model::relation::{CreateRelationInput, Relation, RelationType};
use crate::registry::TypeRegistry;
use crate::relations::RelationGraph;
use crate::storage::{StorageAdapter, StorageError, StorageFilter};
use crate::validation::ValidationError;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use middleware::{
    from_fn, Middleware, Next, OperationArgs, OperationContext, OperationOutput,
};

pub type ClientResult<T> = Result<T, ClientError>;

/// Boxed storage backend owned by the client.
pub type BoxedStorage = Box<dyn StorageAdapter + Send>;

/// Client operation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    SoftDelete,
    HardDelete,
    Restore,
    Link,
    Save,
    Load,
    Remove,
    List,
    Search,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::SoftDelete => "soft_delete",
            Self::HardDelete => "hard_delete",
            Self::Restore => "restore",
            Self::Link => "link",
            Self::Save => "save",
            Self::Load => "load",
            Self::Remove => "remove",
            Self::List => "list",
            Self::Search => "search",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-level failures.
#[derive(Debug)]
pub enum ClientError {
    UnknownTypeSlug(String),
    UnknownTypeId(String),
    Validation {
        type_slug: String,
        errors: Vec<ValidationError>,
    },
    StorageNotConfigured {
        operation: Operation,
    },
    Storage(StorageError),
    /// A handler stopped the operation.
    Rejected {
        operation: Operation,
        reason: String,
    },
    /// The pipeline finished without a result of the expected kind.
    NoResult {
        operation: Operation,
    },
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTypeSlug(slug) => write!(f, "minion type with slug `{slug}` not found"),
            Self::UnknownTypeId(id) => write!(f, "minion type `{id}` not found"),
            Self::Validation { type_slug, errors } => {
                write!(f, "validation failed for `{type_slug}`")?;
                for err in errors {
                    write!(f, "\n- {}: {}", err.field, err.message)?;
                }
                Ok(())
            }
            Self::StorageNotConfigured { operation } => {
                write!(f, "`{operation}` requires a storage backend")
            }
            Self::Storage(err) => write!(f, "{err}"),
            Self::Rejected { operation, reason } => {
                write!(f, "`{operation}` rejected: {reason}")
            }
            Self::NoResult { operation } => write!(f, "`{operation}` produced no result"),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for ClientError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Builder for [`Minions`].
#[derive(Default)]
pub struct MinionsBuilder {
    registry: Option<TypeRegistry>,
    storage: Option<BoxedStorage>,
    middleware: Vec<Box<dyn Middleware>>,
}

impl MinionsBuilder {
    /// Replaces the default registry (built-ins only).
    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn storage(mut self, storage: impl StorageAdapter + Send + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    /// Appends one handler; handlers run in the order they were added.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    pub fn build(self) -> Minions {
        Minions {
            registry: self.registry.unwrap_or_else(TypeRegistry::new),
            graph: RelationGraph::new(),
            storage: self.storage,
            middleware: self.middleware,
        }
    }
}

/// Entry point bundling registry, relation graph and optional storage.
pub struct Minions {
    pub registry: TypeRegistry,
    pub graph: RelationGraph,
    storage: Option<BoxedStorage>,
    middleware: Vec<Box<dyn Middleware>>,
}

impl Default for Minions {
    fn default() -> Self {
        Self::new()
    }
}

impl Minions {
    /// Client with built-in types, no storage and no middleware.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> MinionsBuilder {
        MinionsBuilder::default()
    }

    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    /// Creates a minion of the type registered under `type_slug`.
    ///
    /// # Errors
    /// - `UnknownTypeSlug` when no such type is registered.
    /// - `Validation` when the fields do not satisfy the schema.
    pub fn create(&mut self, type_slug: &str, input: CreateMinionInput) -> ClientResult<Minion> {
        let args = OperationArgs::Create {
            type_slug: type_slug.to_string(),
            input,
        };
        expect_minion(self.dispatch(args)?, Operation::Create)
    }

    /// Applies `input` to `minion`; rejects an invalid result.
    pub fn update(&mut self, minion: &Minion, input: UpdateMinionInput) -> ClientResult<Minion> {
        let args = OperationArgs::Update {
            minion: minion.clone(),
            input,
        };
        expect_minion(self.dispatch(args)?, Operation::Update)
    }

    pub fn soft_delete(&mut self, minion: &Minion, deleted_by: Option<&str>) -> ClientResult<Minion> {
        let args = OperationArgs::SoftDelete {
            minion: minion.clone(),
            deleted_by: deleted_by.map(str::to_string),
        };
        expect_minion(self.dispatch(args)?, Operation::SoftDelete)
    }

    /// Drops every relation touching `minion`; returns how many were removed.
    pub fn hard_delete(&mut self, minion: &Minion) -> ClientResult<usize> {
        let args = OperationArgs::HardDelete {
            minion: minion.clone(),
        };
        match self.dispatch(args)? {
            OperationOutput::Removed(count) => Ok(count),
            _ => Err(ClientError::NoResult {
                operation: Operation::HardDelete,
            }),
        }
    }

    pub fn restore(&mut self, minion: &Minion) -> ClientResult<Minion> {
        let args = OperationArgs::Restore {
            minion: minion.clone(),
        };
        expect_minion(self.dispatch(args)?, Operation::Restore)
    }

    /// Adds a relation from `source` to `target`.
    pub fn link(
        &mut self,
        source: MinionId,
        target: MinionId,
        relation_type: RelationType,
    ) -> ClientResult<Relation> {
        let args = OperationArgs::Link {
            input: CreateRelationInput::new(source, target, relation_type),
        };
        match self.dispatch(args)? {
            OperationOutput::Relation(relation) => Ok(relation),
            _ => Err(ClientError::NoResult {
                operation: Operation::Link,
            }),
        }
    }

    pub fn save(&mut self, minion: &Minion) -> ClientResult<()> {
        let args = OperationArgs::Save {
            minion: minion.clone(),
        };
        self.dispatch(args).map(|_| ())
    }

    pub fn load(&mut self, id: MinionId) -> ClientResult<Option<Minion>> {
        match self.dispatch(OperationArgs::Load { id })? {
            OperationOutput::MaybeMinion(found) => Ok(found),
            _ => Err(ClientError::NoResult {
                operation: Operation::Load,
            }),
        }
    }

    /// Deletes the stored record (attachments included, where supported).
    pub fn remove(&mut self, id: MinionId) -> ClientResult<()> {
        self.dispatch(OperationArgs::Remove { id }).map(|_| ())
    }

    pub fn list(&mut self, filter: StorageFilter) -> ClientResult<Vec<Minion>> {
        expect_minions(self.dispatch(OperationArgs::List { filter })?, Operation::List)
    }

    pub fn search(&mut self, query: &str) -> ClientResult<Vec<Minion>> {
        let args = OperationArgs::Search {
            query: query.to_string(),
        };
        expect_minions(self.dispatch(args)?, Operation::Search)
    }

    fn dispatch(&mut self, args: OperationArgs) -> ClientResult<OperationOutput> {
        let operation = args.operation();
        let mut ctx = OperationContext::new(args);

        let Self {
            registry,
            graph,
            storage,
            middleware,
        } = self;
        let mut core =
            |ctx: &mut OperationContext| execute(registry, graph, storage.as_mut(), ctx);

        match Next::new(middleware.as_slice(), &mut core).run(&mut ctx) {
            Ok(()) => {
                debug!(
                    "event=client_op module=client status=ok operation={}",
                    operation
                );
                ctx.result.ok_or(ClientError::NoResult { operation })
            }
            Err(err) => {
                warn!(
                    "event=client_op module=client status=error operation={} error={}",
                    operation, err
                );
                Err(err)
            }
        }
    }
}

/// Core behavior of each operation, run at the end of the chain.
fn execute(
    registry: &TypeRegistry,
    graph: &mut RelationGraph,
    storage: Option<&mut BoxedStorage>,
    ctx: &mut OperationContext,
) -> ClientResult<()> {
    let operation = ctx.operation();
    let output = match &ctx.args {
        OperationArgs::Create { type_slug, input } => {
            let minion_type = registry
                .get_by_slug(type_slug)
                .ok_or_else(|| ClientError::UnknownTypeSlug(type_slug.clone()))?;
            let outcome = create_minion(input.clone(), minion_type);
            if !outcome.validation.valid {
                return Err(ClientError::Validation {
                    type_slug: minion_type.slug.clone(),
                    errors: outcome.validation.errors,
                });
            }
            OperationOutput::Minion(outcome.minion)
        }
        OperationArgs::Update { minion, input } => {
            let minion_type = registry
                .get_by_id(&minion.minion_type_id)
                .ok_or_else(|| ClientError::UnknownTypeId(minion.minion_type_id.clone()))?;
            let outcome = update_minion(minion, input.clone(), minion_type);
            if !outcome.validation.valid {
                return Err(ClientError::Validation {
                    type_slug: minion_type.slug.clone(),
                    errors: outcome.validation.errors,
                });
            }
            OperationOutput::Minion(outcome.minion)
        }
        OperationArgs::SoftDelete { minion, deleted_by } => {
            OperationOutput::Minion(soft_delete(minion, deleted_by.as_deref()))
        }
        OperationArgs::HardDelete { minion } => OperationOutput::Removed(hard_delete(minion, graph)),
        OperationArgs::Restore { minion } => OperationOutput::Minion(restore_minion(minion)),
        OperationArgs::Link { input } => OperationOutput::Relation(graph.add(input.clone())),
        OperationArgs::Save { minion } => {
            require_storage(storage, operation)?.set(minion.clone())?;
            OperationOutput::Done
        }
        OperationArgs::Load { id } => {
            OperationOutput::MaybeMinion(require_storage(storage, operation)?.get(*id)?)
        }
        OperationArgs::Remove { id } => {
            require_storage(storage, operation)?.delete(*id)?;
            OperationOutput::Done
        }
        OperationArgs::List { filter } => {
            OperationOutput::Minions(require_storage(storage, operation)?.list(filter)?)
        }
        OperationArgs::Search { query } => {
            OperationOutput::Minions(require_storage(storage, operation)?.search(query)?)
        }
    };
    ctx.result = Some(output);
    Ok(())
}

fn require_storage(
    storage: Option<&mut BoxedStorage>,
    operation: Operation,
) -> ClientResult<&mut BoxedStorage> {
    storage.ok_or(ClientError::StorageNotConfigured { operation })
}

fn expect_minion(output: OperationOutput, operation: Operation) -> ClientResult<Minion> {
    match output {
        OperationOutput::Minion(minion) => Ok(minion),
        _ => Err(ClientError::NoResult { operation }),
    }
}

fn expect_minions(output: OperationOutput, operation: Operation) -> ClientResult<Vec<Minion>> {
    match output {
        OperationOutput::Minions(minions) => Ok(minions),
        _ => Err(ClientError::NoResult { operation }),
    }
}
