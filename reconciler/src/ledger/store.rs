use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use corelib::{DocKind, Document};
use serde_json::Value;

use crate::commit::{CommitError, Mutation};
use crate::ledger::DocRef;
use crate::logger::warn_if_slow;
use crate::ledger::repository::DocumentStore;

/// Typed access to the order ledger. Reads decode into model types; the only
/// write path is [`OrderLedger::commit`].
#[derive(Clone)]
pub struct OrderLedger {
    repo: Arc<dyn DocumentStore>,
}

impl OrderLedger {
    pub fn new(repo: Arc<dyn DocumentStore>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self), target = "store", fields(kind = %D::KIND))]
    pub async fn get<D: Document>(&self, uid: &str) -> Result<Option<D>> {
        let doc = DocRef::of::<D>(uid);
        debug!("fetching document");

        let raw = warn_if_slow("db_get", Duration::from_millis(100), async {
            self.repo.get(&doc).await
        })
        .await
        .with_context(|| format!("repository get {doc} failed"))?;

        raw.map(|v| serde_json::from_value(v).with_context(|| format!("decoding {doc}")))
            .transpose()
    }

    /// Documents of type `D` whose dot-path `field` equals `value`.
    #[instrument(skip(self, value), target = "store", fields(kind = %D::KIND))]
    pub async fn find<D: Document>(&self, field: &str, value: &Value) -> Result<Vec<D>> {
        let raw = warn_if_slow("db_find", Duration::from_millis(200), async {
            self.repo.find(D::KIND, field, value).await
        })
        .await
        .with_context(|| format!("repository find {}.{field} failed", D::KIND))?;

        let mut out = Vec::with_capacity(raw.len());
        for v in raw {
            match serde_json::from_value(v) {
                Ok(d) => out.push(d),
                Err(e) => warn!(error = %e, "skipping undecodable document"),
            }
        }
        Ok(out)
    }

    /// First match of [`OrderLedger::find`], if any.
    pub async fn find_one<D: Document>(&self, field: &str, value: &Value) -> Result<Option<D>> {
        Ok(self.find::<D>(field, value).await?.into_iter().next())
    }

    pub async fn exists(&self, kind: DocKind, uid: &str) -> Result<bool> {
        let doc = DocRef::new(kind, uid);
        Ok(self
            .repo
            .get(&doc)
            .await
            .with_context(|| format!("repository get {doc} failed"))?
            .is_some())
    }

    #[instrument(skip(self, mutations), target = "store", fields(mutations = mutations.len()))]
    pub async fn commit(&self, mutations: &[Mutation]) -> Result<(), CommitError> {
        debug!("committing batch");

        warn_if_slow("db_commit", Duration::from_millis(100), async {
            self.repo.commit(mutations).await
        })
        .await
    }
}
