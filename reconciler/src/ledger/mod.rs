//! Order ledger: orders plus the business documents they drive, stored as
//! JSON documents keyed by `(kind, uid)`.

pub mod memory;
pub mod repository;
pub mod repository_sqlx;
pub mod store;

use std::fmt;

use corelib::{DocKind, Document};

/// Address of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocRef {
    pub kind: DocKind,
    pub uid: String,
}

impl DocRef {
    pub fn new(kind: DocKind, uid: impl Into<String>) -> Self {
        Self {
            kind,
            uid: uid.into(),
        }
    }

    pub fn of<D: Document>(uid: impl Into<String>) -> Self {
        Self::new(D::KIND, uid)
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.uid)
    }
}
