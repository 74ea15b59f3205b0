//! Wiring helpers for the request layer that embeds the engine.

use std::sync::Arc;
use std::time::Duration;

use corelib::{Match, Network};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::client::{LedgerClient, Wallet};
use crate::config::AppConfig;
use crate::db::Db;
use crate::dispatch::{MatchRouter, RetryPolicy};
use crate::ledger::repository_sqlx::SqlxStore;
use crate::ledger::store::OrderLedger;
use crate::metrics::counters::Counters;
use crate::processor::Reconciler;
use crate::workflow::WorkflowContext;

/// Connects to the database, runs migrations and builds the order ledger.
pub async fn init_store(cfg: &AppConfig) -> anyhow::Result<OrderLedger> {
    let db = Db::connect(&cfg.database_url).await?;
    db.migrate().await?;

    let repo = Arc::new(SqlxStore::new(db.pool.clone()));
    Ok(OrderLedger::new(repo))
}

/// A running engine: matches sent on `tx` are reconciled in the background.
pub struct Engine {
    pub tx: mpsc::Sender<Match>,
    pub router: Arc<MatchRouter>,
    pub counters: Counters,
    handle: JoinHandle<()>,
}

impl Engine {
    /// Starts the router over `ledger`. Storage costs are taken from the
    /// wallet for `network`, so outputs are sized with live parameters.
    pub async fn start(
        cfg: &AppConfig,
        ledger: OrderLedger,
        client: Arc<dyn LedgerClient>,
        wallet: Arc<dyn Wallet>,
        network: Network,
    ) -> anyhow::Result<Self> {
        let params = wallet.cost_parameters(network).await?;
        let ctx = WorkflowContext::new(ledger, client, wallet, params).with_config(cfg);

        let counters = Counters::default();
        let reconciler = Arc::new(Reconciler::new(ctx, counters.clone()));
        let router = Arc::new(MatchRouter::new(
            reconciler,
            RetryPolicy::from_config(cfg),
            cfg.max_in_flight,
            Duration::from_millis(cfg.worker_idle_ms),
        ));

        let (tx, rx) = mpsc::channel::<Match>(cfg.intake_capacity);
        let handle = tokio::spawn(router.clone().run(rx));

        info!(%network, "reconciliation engine started");
        Ok(Self {
            tx,
            router,
            counters,
            handle,
        })
    }

    /// Stops accepting matches and waits for the router loop to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "router task ended abnormally");
        }
    }
}
