//! Per-order serialization of match processing.
//!
//! Guarantees:
//! - FIFO processing per order uid
//! - isolation between orders
//! - bounded memory via a global in-flight budget
//!
//! Workers are short-lived: after an idle period a worker closes its queue,
//! drains whatever was already accepted, and exits, removing its own entry.
//! A send that races the exit fails and is re-routed to a fresh worker,
//! which waits for its predecessor to finish before taking any work, so
//! nothing accepted is lost or reordered.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use corelib::Match;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{Receiver, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, warn};

use super::retry::RetryPolicy;
use crate::logger::{TraceId, root_span};
use crate::processor::Reconciler;

type Workers = Arc<Mutex<HashMap<String, WorkerHandle>>>;

/// A match holding its share of the in-flight budget until processed.
struct Queued {
    m: Match,
    _permit: OwnedSemaphorePermit,
}

struct WorkerHandle {
    id: u64,
    tx: UnboundedSender<Queued>,
    task: JoinHandle<()>,
}

pub struct MatchRouter {
    reconciler: Arc<Reconciler>,
    retry: RetryPolicy,
    idle: Duration,

    /// Accepted but unprocessed matches across all orders. Submitting only
    /// waits once this is exhausted.
    in_flight: Arc<Semaphore>,

    /// Live workers keyed by order uid.
    workers: Workers,
    next_worker_id: AtomicU64,
}

impl MatchRouter {
    pub fn new(
        reconciler: Arc<Reconciler>,
        retry: RetryPolicy,
        max_in_flight: usize,
        idle: Duration,
    ) -> Self {
        Self {
            reconciler,
            retry,
            idle,
            in_flight: Arc::new(Semaphore::new(max_in_flight.max(1))),
            workers: Arc::new(Mutex::new(HashMap::new())),
            next_worker_id: AtomicU64::new(0),
        }
    }

    /// Main router loop. Delivers work and nothing else.
    pub async fn run(self: Arc<Self>, mut rx: Receiver<Match>) {
        info!(component = "router", event = "startup", "match router started");

        while let Some(m) = rx.recv().await {
            self.submit(m).await;
        }

        warn!(component = "router", event = "shutdown", "match channel closed");
    }

    /// Hands `m` to its order's worker, spawning one when needed.
    pub async fn submit(&self, m: Match) {
        let Ok(permit) = self.in_flight.clone().acquire_owned().await else {
            error!(component = "router", message_id = %m.message_id, "in-flight budget closed");
            return;
        };

        let order_uid = m.order_uid().to_string();
        let mut item = Queued { m, _permit: permit };

        for _ in 0..2 {
            let (id, tx) = self.get_or_spawn_worker(&order_uid).await;
            match tx.send(item) {
                Ok(()) => return,
                Err(SendError(back)) => {
                    // the worker went idle between lookup and send
                    debug!(component = "router", %order_uid, "worker gone; respawning");
                    forget_worker(&self.workers, &order_uid, id).await;
                    item = back;
                }
            }
        }

        error!(
            component = "router",
            %order_uid,
            message_id = %item.m.message_id,
            "fresh worker rejected match; left for redelivery"
        );
    }

    /// Number of workers whose queue is still open.
    pub async fn active_workers(&self) -> usize {
        self.workers
            .lock()
            .await
            .values()
            .filter(|w| !w.tx.is_closed())
            .count()
    }

    /// Number of orders with a worker entry, open or winding down.
    pub async fn tracked_orders(&self) -> usize {
        self.workers.lock().await.len()
    }

    async fn get_or_spawn_worker(&self, order_uid: &str) -> (u64, UnboundedSender<Queued>) {
        let mut workers = self.workers.lock().await;

        if let Some(w) = workers.get(order_uid).filter(|w| !w.tx.is_closed()) {
            return (w.id, w.tx.clone());
        }

        // a closing worker may still be draining; its successor waits for it
        let predecessor = workers.remove(order_uid).map(|w| w.task);

        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = OrderWorker {
            id,
            reconciler: self.reconciler.clone(),
            retry: self.retry,
            idle: self.idle,
            order_uid: order_uid.to_string(),
            workers: self.workers.clone(),
        };
        let task = tokio::spawn(worker.run(rx, predecessor));
        workers.insert(
            order_uid.to_string(),
            WorkerHandle {
                id,
                tx: tx.clone(),
                task,
            },
        );

        debug!(component = "router", %order_uid, worker = id, "spawned order worker");
        (id, tx)
    }
}

/// Drops the entry for `order_uid` if it still belongs to worker `id`.
async fn forget_worker(workers: &Workers, order_uid: &str, id: u64) {
    let mut workers = workers.lock().await;
    if workers.get(order_uid).is_some_and(|w| w.id == id) {
        workers.remove(order_uid);
    }
}

/// Processes the matches of one order sequentially.
struct OrderWorker {
    id: u64,
    reconciler: Arc<Reconciler>,
    retry: RetryPolicy,
    idle: Duration,
    order_uid: String,
    workers: Workers,
}

impl OrderWorker {
    async fn run(self, mut rx: UnboundedReceiver<Queued>, predecessor: Option<JoinHandle<()>>) {
        if let Some(prev) = predecessor {
            if let Err(e) = prev.await {
                error!(component = "worker", order_uid = %self.order_uid, error = %e, "previous worker ended abnormally");
            }
        }

        loop {
            match tokio::time::timeout(self.idle, rx.recv()).await {
                Ok(Some(q)) => self.handle(q).await,
                Ok(None) => break,
                Err(_) => {
                    rx.close();
                    while let Ok(q) = rx.try_recv() {
                        self.handle(q).await;
                    }
                    break;
                }
            }
        }

        forget_worker(&self.workers, &self.order_uid, self.id).await;
        debug!(component = "worker", order_uid = %self.order_uid, worker = self.id, "worker exiting");
    }

    async fn handle(&self, q: Queued) {
        let span = root_span("reconcile", &TraceId::random());
        async {
            // failures are logged and counted by the reconciler
            if let Ok(outcome) = self.reconciler.reconcile(&q.m, &self.retry).await {
                debug!(%outcome, "match processed");
            }
        }
        .instrument(span)
        .await
    }
}
