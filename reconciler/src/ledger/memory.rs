use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use corelib::DocKind;
use parking_lot::RwLock;
use serde_json::Value;

use crate::commit::apply::lookup;
use crate::commit::{CommitError, Mutation, apply_mutation};
use crate::ledger::DocRef;
use crate::ledger::repository::DocumentStore;

/// In-process document store for tests and embedded use.
///
/// Commits run under one write lock against a staged copy, so a failing
/// mutation leaves every document untouched.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<DocRef, Value>>,
    commits: AtomicUsize,
    /// Number of upcoming commits that fail with a backend error.
    fail_next: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document outside of any batch.
    pub fn insert(&self, doc: DocRef, body: Value) {
        self.docs.write().insert(doc, body);
    }

    pub fn len(&self, kind: DocKind) -> usize {
        self.docs.read().keys().filter(|d| d.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// All documents of `kind`, in uid order.
    pub fn all(&self, kind: DocKind) -> Vec<Value> {
        self.docs
            .read()
            .iter()
            .filter(|(d, _)| d.kind == kind)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Makes the next `n` commits fail as if the backend were unreachable.
    pub fn fail_next_commits(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, doc: &DocRef) -> Result<Option<Value>> {
        Ok(self.docs.read().get(doc).cloned())
    }

    async fn find(&self, kind: DocKind, field: &str, value: &Value) -> Result<Vec<Value>> {
        Ok(self
            .docs
            .read()
            .iter()
            .filter(|(d, body)| d.kind == kind && lookup(body, field) == Some(value))
            .map(|(_, body)| body.clone())
            .collect())
    }

    async fn commit(&self, mutations: &[Mutation]) -> Result<(), CommitError> {
        if self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(CommitError::Backend(anyhow::anyhow!(
                "memory store: injected failure"
            )));
        }

        let mut docs = self.docs.write();
        let mut staged: BTreeMap<DocRef, Option<Value>> = BTreeMap::new();

        for m in mutations {
            let current = match staged.get(&m.doc) {
                Some(v) => v.clone(),
                None => docs.get(&m.doc).cloned(),
            };
            let next = apply_mutation(current, m)?;
            staged.insert(m.doc.clone(), next);
        }

        for (doc, next) in staged {
            match next {
                Some(body) => {
                    docs.insert(doc, body);
                }
                None => {
                    docs.remove(&doc);
                }
            }
        }

        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn failed_batch_leaves_store_untouched() {
        let store = MemoryStore::new();
        store.insert(DocRef::new(DocKind::Awards, "a1"), json!({"uid": "a1", "funded": false}));

        let batch = vec![
            Mutation::update(DocKind::Awards, "a1", json!({"funded": true})),
            Mutation::update(DocKind::Awards, "missing", json!({"x": 1})),
        ];

        let err = store.commit(&batch).await.unwrap_err();
        assert!(err.is_conflict());

        let a1 = store
            .get(&DocRef::new(DocKind::Awards, "a1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(a1["funded"], false);
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn later_mutations_see_earlier_ones_in_the_same_batch() {
        let store = MemoryStore::new();
        let batch = vec![
            Mutation {
                doc: DocRef::new(DocKind::Awards, "a1"),
                data: json!({"uid": "a1", "funded": false}),
                action: crate::commit::Action::Create,
            },
            Mutation::update_if(
                DocKind::Awards,
                "a1",
                json!({"funded": true}),
                "funded",
                json!(false),
            ),
        ];

        store.commit(&batch).await.unwrap();
        let a1 = store
            .get(&DocRef::new(DocKind::Awards, "a1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(a1["funded"], true);
    }

    #[tokio::test]
    async fn find_matches_nested_fields() {
        let store = MemoryStore::new();
        store.insert(
            DocRef::new(DocKind::Nfts, "n1"),
            json!({"uid": "n1", "minting": {"nft_id": "0xabc"}}),
        );
        store.insert(
            DocRef::new(DocKind::Nfts, "n2"),
            json!({"uid": "n2", "minting": null}),
        );

        let hits = store
            .find(DocKind::Nfts, "minting.nft_id", &json!("0xabc"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["uid"], "n1");
    }

    #[tokio::test]
    async fn injected_failures_are_backend_errors() {
        let store = MemoryStore::new();
        store.fail_next_commits(1);

        let batch = vec![Mutation::delete(DocKind::Awards, "a1")];
        let err = store.commit(&batch).await.unwrap_err();
        assert!(matches!(err, CommitError::Backend(_)));
        assert!(err.is_transient());

        store.commit(&batch).await.unwrap();
        assert_eq!(store.commit_count(), 1);
    }
}
