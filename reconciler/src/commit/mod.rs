//! Batched commit layer.
//!
//! Handlers never write. They return a command buffer (`Vec<Mutation>`) and
//! the processor hands the whole buffer to [`DocumentStore::commit`], which
//! applies every mutation or none.
//!
//! [`DocumentStore::commit`]: crate::ledger::repository::DocumentStore::commit

pub mod apply;

use corelib::{DocKind, Document};
use serde_json::Value;
use thiserror::Error;

use crate::ledger::DocRef;

pub use apply::apply_mutation;

/// Field guard on an update. `field` is a dot path; an absent field and a
/// `null` field both satisfy `equals: Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Precondition {
    pub field: String,
    pub equals: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Fails if the document exists.
    Create,
    /// Upsert; replaces the whole document.
    Set,
    /// Top-level merge. Fails if the document is missing or the
    /// precondition does not hold.
    Update { precondition: Option<Precondition> },
    /// Adds `by` to a numeric field; absent or null counts as zero.
    Increment { field: String, by: i64 },
    /// Removes the document; deleting a missing document is not an error.
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub doc: DocRef,
    pub data: Value,
    pub action: Action,
}

impl Mutation {
    pub fn create<D: Document>(doc: &D) -> Result<Self, serde_json::Error> {
        Ok(Self {
            doc: DocRef::of::<D>(doc.uid()),
            data: serde_json::to_value(doc)?,
            action: Action::Create,
        })
    }

    pub fn set<D: Document>(doc: &D) -> Result<Self, serde_json::Error> {
        Ok(Self {
            doc: DocRef::of::<D>(doc.uid()),
            data: serde_json::to_value(doc)?,
            action: Action::Set,
        })
    }

    pub fn update(kind: DocKind, uid: impl Into<String>, data: Value) -> Self {
        Self {
            doc: DocRef::new(kind, uid),
            data,
            action: Action::Update { precondition: None },
        }
    }

    /// Update that only applies while `field == equals`.
    pub fn update_if(
        kind: DocKind,
        uid: impl Into<String>,
        data: Value,
        field: impl Into<String>,
        equals: Value,
    ) -> Self {
        Self {
            doc: DocRef::new(kind, uid),
            data,
            action: Action::Update {
                precondition: Some(Precondition {
                    field: field.into(),
                    equals,
                }),
            },
        }
    }

    pub fn increment(kind: DocKind, uid: impl Into<String>, field: impl Into<String>, by: i64) -> Self {
        Self {
            doc: DocRef::new(kind, uid),
            data: Value::Null,
            action: Action::Increment {
                field: field.into(),
                by,
            },
        }
    }

    pub fn delete(kind: DocKind, uid: impl Into<String>) -> Self {
        Self {
            doc: DocRef::new(kind, uid),
            data: Value::Null,
            action: Action::Delete,
        }
    }
}

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("{0} already exists")]
    AlreadyExists(DocRef),

    #[error("{0} does not exist")]
    Missing(DocRef),

    #[error("precondition on {doc}.{field} failed")]
    PreconditionFailed { doc: DocRef, field: String },

    #[error("{doc}.{field} is not an integer field")]
    NotNumeric { doc: DocRef, field: String },

    #[error("invalid document body for {doc}: {reason}")]
    InvalidBody { doc: DocRef, reason: String },

    #[error("store backend unavailable: {0:#}")]
    Backend(#[source] anyhow::Error),
}

impl CommitError {
    /// Conflicts mean another writer got there first (or the batch was built
    /// from stale reads); the store was left untouched.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CommitError::AlreadyExists(_)
                | CommitError::Missing(_)
                | CommitError::PreconditionFailed { .. }
        )
    }

    /// True when the same batch could succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        self.is_conflict() || matches!(self, CommitError::Backend(_))
    }
}
