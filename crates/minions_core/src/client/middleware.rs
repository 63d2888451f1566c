//! Onion-style middleware around client operations.
//!
//! # Invariants
//! - Handlers run in registration order; the core operation runs after the
//!   last handler calls `next.run`.
//! - `Next::run` consumes `next`, so a handler invokes the rest of the chain
//!   at most once. Not calling it short-circuits the operation.

use super::{ClientResult, Operation};
use crate::model::minion::{CreateMinionInput, Minion, MinionId, UpdateMinionInput};
use crate::model::relation::{CreateRelationInput, Relation};
use crate::storage::StorageFilter;
use serde_json::Value;
use std::collections::BTreeMap;

/// Typed arguments of one client operation. Handlers may rewrite them
/// before the core operation reads them.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationArgs {
    Create {
        type_slug: String,
        input: CreateMinionInput,
    },
    Update {
        minion: Minion,
        input: UpdateMinionInput,
    },
    SoftDelete {
        minion: Minion,
        deleted_by: Option<String>,
    },
    HardDelete {
        minion: Minion,
    },
    Restore {
        minion: Minion,
    },
    Link {
        input: CreateRelationInput,
    },
    Save {
        minion: Minion,
    },
    Load {
        id: MinionId,
    },
    Remove {
        id: MinionId,
    },
    List {
        filter: StorageFilter,
    },
    Search {
        query: String,
    },
}

impl OperationArgs {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Create { .. } => Operation::Create,
            Self::Update { .. } => Operation::Update,
            Self::SoftDelete { .. } => Operation::SoftDelete,
            Self::HardDelete { .. } => Operation::HardDelete,
            Self::Restore { .. } => Operation::Restore,
            Self::Link { .. } => Operation::Link,
            Self::Save { .. } => Operation::Save,
            Self::Load { .. } => Operation::Load,
            Self::Remove { .. } => Operation::Remove,
            Self::List { .. } => Operation::List,
            Self::Search { .. } => Operation::Search,
        }
    }
}

/// Result produced by the core operation (or a short-circuiting handler).
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    Minion(Minion),
    MaybeMinion(Option<Minion>),
    Minions(Vec<Minion>),
    Relation(Relation),
    /// Number of relations removed by a hard delete.
    Removed(usize),
    Done,
}

/// Mutable state threaded through the middleware chain.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationContext {
    pub args: OperationArgs,
    pub result: Option<OperationOutput>,
    /// Free-form data handlers share with each other.
    pub metadata: BTreeMap<String, Value>,
}

impl OperationContext {
    pub fn new(args: OperationArgs) -> Self {
        Self {
            args,
            result: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.args.operation()
    }
}

/// One layer of the client pipeline.
pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: &mut OperationContext, next: Next<'_>) -> ClientResult<()>;
}

/// Core operation invoked after the last handler.
pub type CoreFn<'a> = dyn FnMut(&mut OperationContext) -> ClientResult<()> + 'a;

/// Remainder of the chain as seen by one handler.
pub struct Next<'a> {
    remaining: &'a [Box<dyn Middleware>],
    core: &'a mut CoreFn<'a>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Box<dyn Middleware>], core: &'a mut CoreFn<'a>) -> Self {
        Self {
            remaining: chain,
            core,
        }
    }

    /// Runs the next handler, or the core operation at the end of the chain.
    pub fn run(self, ctx: &mut OperationContext) -> ClientResult<()> {
        match self.remaining.split_first() {
            Some((handler, rest)) => handler.handle(
                ctx,
                Next {
                    remaining: rest,
                    core: self.core,
                },
            ),
            None => (self.core)(ctx),
        }
    }
}

/// Middleware built from a closure.
pub struct FnMiddleware<F> {
    handler: F,
}

/// Wraps a closure as a [`Middleware`].
pub fn from_fn<F>(handler: F) -> FnMiddleware<F>
where
    F: Fn(&mut OperationContext, Next<'_>) -> ClientResult<()> + Send + Sync,
{
    FnMiddleware { handler }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut OperationContext, Next<'_>) -> ClientResult<()> + Send + Sync,
{
    fn handle(&self, ctx: &mut OperationContext, next: Next<'_>) -> ClientResult<()> {
        (self.handler)(ctx, next)
    }
}
