use anyhow::Result;
use async_trait::async_trait;
use corelib::DocKind;
use serde_json::Value;

use crate::commit::{CommitError, Mutation};
use crate::ledger::DocRef;

/// Raw document persistence. Typed access goes through
/// [`OrderLedger`](crate::ledger::store::OrderLedger).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, doc: &DocRef) -> Result<Option<Value>>;

    /// Documents of `kind` whose dot-path `field` equals `value`.
    async fn find(&self, kind: DocKind, field: &str, value: &Value) -> Result<Vec<Value>>;

    /// Applies every mutation or none.
    async fn commit(&self, mutations: &[Mutation]) -> Result<(), CommitError>;
}
