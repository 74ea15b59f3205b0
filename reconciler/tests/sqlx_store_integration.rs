mod common;

use std::sync::Arc;

use corelib::{DocKind, Order, Space, SpaceAlias, AliasId, Network, Token, TokenStatus};
use reconciler::client::MemoryLedger;
use reconciler::commit::Mutation;
use reconciler::db::Db;
use reconciler::ledger::repository_sqlx::SqlxStore;
use reconciler::ledger::store::OrderLedger;
use reconciler::metrics::counters::Counters;
use reconciler::output::CostParameters;
use reconciler::processor::{ReconcileOutcome, Reconciler};
use reconciler::workflow::WorkflowContext;
use serde_json::json;
use uuid::Uuid;

use common::*;

/// Isolated in-memory SQLite database per test. The unique name keeps
/// parallel tests apart while the shared cache lets pooled connections see
/// the same data.
async fn setup_ledger() -> OrderLedger {
    let url = format!("sqlite:file:{}?mode=memory&cache=shared", Uuid::new_v4());
    let db = Db::connect(&url).await.unwrap();
    db.migrate().await.unwrap();
    OrderLedger::new(Arc::new(SqlxStore::new(db.pool.clone())))
}

fn space(uid: &str, alias: &str) -> Space {
    Space {
        uid: uid.into(),
        name: uid.into(),
        alias: Some(SpaceAlias {
            alias_id: AliasId::new(alias),
            network: Network::Rms,
            governor: None,
        }),
        claimed: true,
    }
}

#[tokio::test]
async fn documents_round_trip_and_match_nested_fields() {
    let ledger = setup_ledger().await;
    seed(&ledger, &space("s1", "0xa")).await;
    seed(&ledger, &space("s2", "0xb")).await;

    let s: Space = ledger.get("s2").await.unwrap().unwrap();
    assert_eq!(s, space("s2", "0xb"));

    let found: Option<Space> = ledger
        .find_one("alias.alias_id", &json!("0xa"))
        .await
        .unwrap();
    assert_eq!(found.map(|s| s.uid), Some("s1".to_string()));

    let claimed: Vec<Space> = ledger.find("claimed", &json!(true)).await.unwrap();
    assert_eq!(claimed.len(), 2);

    assert!(ledger.get::<Space>("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn failed_batch_rolls_back_entirely() {
    let ledger = setup_ledger().await;
    seed(&ledger, &token("t1")).await;

    let err = ledger
        .commit(&[
            Mutation::update(DocKind::Tokens, "t1", json!({ "status": TokenStatus::Minting })),
            Mutation::create(&token("t1")).unwrap(),
        ])
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let t: Token = ledger.get("t1").await.unwrap().unwrap();
    assert_eq!(t.status, TokenStatus::Available);
}

#[tokio::test]
async fn preconditions_and_increments_apply_in_sql_transactions() {
    let ledger = setup_ledger().await;
    seed(&ledger, &award("aw1")).await;

    // absent and null satisfy the same guard
    ledger
        .commit(&[Mutation::update_if(
            DocKind::Awards,
            "aw1",
            json!({ "alias_id": "0xalias" }),
            "alias_id",
            json!(null),
        )])
        .await
        .unwrap();

    let again = ledger
        .commit(&[Mutation::update_if(
            DocKind::Awards,
            "aw1",
            json!({ "alias_id": "0xother" }),
            "alias_id",
            json!(null),
        )])
        .await
        .unwrap_err();
    assert!(again.is_conflict());

    ledger
        .commit(&[
            Mutation::increment(DocKind::Awards, "aw1", "issued", 2),
            Mutation::increment(DocKind::Awards, "aw1", "issued", 3),
        ])
        .await
        .unwrap();

    let a: corelib::Award = ledger.get("aw1").await.unwrap().unwrap();
    assert_eq!(a.issued, 5);
    assert_eq!(a.alias_id, Some(AliasId::new("0xalias")));
}

#[tokio::test]
async fn reconciler_runs_against_sql_store() {
    let ledger = setup_ledger().await;
    let chain = Arc::new(MemoryLedger::default());
    let ctx = WorkflowContext::new(
        ledger.clone(),
        chain.clone(),
        chain,
        CostParameters::default(),
    );

    seed(&ledger, &token("t1")).await;
    let order = mint_token_order("o1", "t1");
    seed(&ledger, &order).await;

    let r = Reconciler::new(ctx, Counters::default());
    let m = match_for(&order, 100, "m-1");

    let first = r.process(&m).await.unwrap();
    assert!(matches!(first, ReconcileOutcome::Reconciled { .. }));
    assert_eq!(r.process(&m).await.unwrap(), ReconcileOutcome::Duplicate);

    let stored: Order = ledger.get("o1").await.unwrap().unwrap();
    assert!(stored.reconciled);
    // payment plus the mint step
    assert_eq!(stored.linked_transactions.len(), 2);
    assert!(ledger.exists(DocKind::Reconciliations, &m.guard_key()).await.unwrap());
}
