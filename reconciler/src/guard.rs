//! Exactly-once consumption of matched transactions.
//!
//! Each `(order uid, message id)` pair is consumed at most once. The guard
//! record is created in the same batch as the work it protects, so when two
//! deliveries of the same key race, the loser's `Create` conflicts at commit
//! and nothing it decided is applied.

use anyhow::Result;
use corelib::{DocKind, Match, Order, Reconciliation};
use serde_json::json;

use crate::commit::Mutation;
use crate::ledger::store::OrderLedger;

#[derive(Clone)]
pub struct ReconciliationGuard {
    ledger: OrderLedger,
}

impl ReconciliationGuard {
    pub fn new(ledger: OrderLedger) -> Self {
        Self { ledger }
    }

    /// True once a batch carrying this key's guard record has committed.
    pub async fn is_consumed(&self, key: &str) -> Result<bool> {
        self.ledger.exists(DocKind::Reconciliations, key).await
    }

    /// Appends the guard record and the order's `reconciled = true` to
    /// `batch`.
    ///
    /// When the order was still open at decision time the update is guarded
    /// on `reconciled == false`, which makes the open -> reconciled
    /// transition single-shot even across processes.
    pub fn mark(
        &self,
        order: &Order,
        m: &Match,
        now: u64,
        batch: &mut Vec<Mutation>,
    ) -> Result<(), serde_json::Error> {
        let record = Reconciliation {
            uid: m.guard_key(),
            order: order.uid.clone(),
            message_id: m.message_id.clone(),
            reconciled_on: now,
        };
        batch.push(Mutation::create(&record)?);

        let data = json!({ "reconciled": true });
        batch.push(if order.reconciled {
            Mutation::update(DocKind::Orders, &order.uid, data)
        } else {
            Mutation::update_if(DocKind::Orders, &order.uid, data, "reconciled", json!(false))
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::memory::MemoryStore;
    use crate::test_support::{match_for, mint_token_order};
    use std::sync::Arc;

    #[tokio::test]
    async fn second_mark_for_same_key_conflicts() {
        let ledger = OrderLedger::new(Arc::new(MemoryStore::new()));
        let guard = ReconciliationGuard::new(ledger.clone());

        let order = mint_token_order("o1", 100);
        ledger.commit(&[Mutation::create(&order).unwrap()]).await.unwrap();

        let m = match_for(&order, 100);
        assert!(!guard.is_consumed(&m.guard_key()).await.unwrap());

        let mut first = vec![];
        guard.mark(&order, &m, 1, &mut first).unwrap();
        let mut second = vec![];
        guard.mark(&order, &m, 2, &mut second).unwrap();

        ledger.commit(&first).await.unwrap();
        let err = ledger.commit(&second).await.unwrap_err();
        assert!(err.is_conflict());

        assert!(guard.is_consumed(&m.guard_key()).await.unwrap());
        let stored: Order = ledger.get("o1").await.unwrap().unwrap();
        assert!(stored.reconciled);
    }

    #[tokio::test]
    async fn open_order_transition_is_single_shot() {
        let ledger = OrderLedger::new(Arc::new(MemoryStore::new()));
        let guard = ReconciliationGuard::new(ledger.clone());

        let order = mint_token_order("o1", 100);
        ledger.commit(&[Mutation::create(&order).unwrap()]).await.unwrap();

        let a = match_for(&order, 100);
        let mut b = match_for(&order, 100);
        b.message_id = corelib::MessageId::new("msg-other");

        let mut first = vec![];
        guard.mark(&order, &a, 1, &mut first).unwrap();
        let mut second = vec![];
        guard.mark(&order, &b, 1, &mut second).unwrap();

        ledger.commit(&first).await.unwrap();
        // decided against the stale open order: precondition fails
        assert!(ledger.commit(&second).await.unwrap_err().is_conflict());
        assert!(!guard.is_consumed(&b.guard_key()).await.unwrap());
    }
}
