//! Match processing: the single path from a confirmed match to one atomic
//! commit.
//!
//! 1. guard pre-check, so a consumed key never reaches a handler
//! 2. re-read the order and check its invariants
//! 3. validate, then either credit or run the workflow handler
//! 4. commit payment record, handler output, follow-up records and guard
//!    mark as one batch
//!
//! A racing duplicate loses at step 4 on the guard record and resolves to a
//! no-op. Anything else that fails leaves the store untouched and is retried
//! by the caller when transient.

use std::fmt;

use corelib::{CreditReason, DocKind, Match, Order, OrderType, Payload};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::commit::Mutation;
use crate::dispatch::RetryPolicy;
use crate::error::ReconcileError;
use crate::guard::ReconciliationGuard;
use crate::logger::annotate_span;
use crate::metrics::counters::Counters;
use crate::time::now_ms;
use crate::validation::{Verdict, validate};
use crate::workflow::records::{full_refund, payment_record};
use crate::workflow::{self, Disposition, MatchInput, WorkflowContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The workflow advanced.
    Reconciled {
        payment: String,
        /// Follow-up records created with the payment: steps, bill payments,
        /// excess or proof-of-control credits.
        records: Vec<String>,
    },
    /// Nothing advanced; everything received went back to the payer.
    Credited { reason: CreditReason, credit: String },
    /// The key was already consumed.
    Duplicate,
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileOutcome::Reconciled { records, .. } => {
                write!(f, "reconciled with {} follow-up record(s)", records.len())
            }
            ReconcileOutcome::Credited { reason, .. } => write!(f, "credited ({reason})"),
            ReconcileOutcome::Duplicate => f.write_str("duplicate"),
        }
    }
}

enum Decision {
    Advance {
        mutations: Vec<Mutation>,
        records: Vec<Order>,
    },
    Credit {
        reason: CreditReason,
        credit: Order,
    },
}

pub struct Reconciler {
    ctx: WorkflowContext,
    guard: ReconciliationGuard,
    counters: Counters,
}

impl Reconciler {
    pub fn new(ctx: WorkflowContext, counters: Counters) -> Self {
        let guard = ReconciliationGuard::new(ctx.ledger.clone());
        Self {
            ctx,
            guard,
            counters,
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Processes `m`, retrying transient failures under `retry`.
    pub async fn reconcile(
        &self,
        m: &Match,
        retry: &RetryPolicy,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        Counters::bump(&self.counters.matches_received);

        let res = retry
            .run(
                move |attempt| {
                    if attempt > 0 {
                        Counters::bump(&self.counters.transient_retries);
                    }
                    self.process(m)
                },
                ReconcileError::is_transient,
            )
            .await;

        if let Err(e) = &res {
            Counters::bump(&self.counters.failures);
            error!(
                order_uid = %m.order_uid(),
                message_id = %m.message_id,
                transient = e.is_transient(),
                error = %e,
                "match left unreconciled"
            );
        }
        res
    }

    /// One attempt at `m`. Either everything it decides is committed or
    /// nothing is.
    pub async fn process(&self, m: &Match) -> Result<ReconcileOutcome, ReconcileError> {
        annotate_span(m.order_uid(), Some(m.message_id.as_str()));

        let key = m.guard_key();
        if self.guard.is_consumed(&key).await? {
            debug!(%key, "key already consumed");
            Counters::bump(&self.counters.duplicates);
            return Ok(ReconcileOutcome::Duplicate);
        }

        // the match carries the matcher's snapshot; decide on current state
        let order: Order = self
            .ctx
            .ledger
            .get(m.order_uid())
            .await?
            .ok_or_else(|| ReconcileError::OrderNotFound(m.order_uid().to_string()))?;

        if order.order_type != OrderType::Order {
            return Err(ReconcileError::Precondition(format!(
                "{} is a {:?} record, not a payable order",
                order.uid, order.order_type
            )));
        }
        order.check_amounts()?;

        let now = now_ms();
        let verdict = if order.reconciled {
            Verdict::Rejected(CreditReason::DataNoLongerValid)
        } else {
            validate(&order, m)
        };

        let mut payment = payment_record(&order, m, false, now);
        let payment_uid = payment.uid.clone();
        let input = MatchInput {
            order: &order,
            m,
            payment_uid: &payment_uid,
            now,
        };

        let decision = match verdict {
            Verdict::Rejected(reason) => Decision::Credit {
                reason,
                credit: full_refund(&input, reason, None),
            },
            Verdict::Accepted => {
                let out = workflow::handle(&self.ctx, input).await?;
                match out.disposition {
                    Disposition::Fulfilled => Decision::Advance {
                        mutations: out.mutations,
                        records: out.records,
                    },
                    Disposition::Rejected { reason, response } => Decision::Credit {
                        reason,
                        credit: full_refund(&input, reason, response),
                    },
                }
            }
        };

        if let (Decision::Credit { .. }, Payload::Payment(p)) = (&decision, &mut payment.payload) {
            p.invalid_payment = true;
        }

        let mut batch = vec![Mutation::create(&payment)?];
        let mut linked = order.linked_transactions.clone();
        linked.push(payment_uid.clone());

        let credits = match &decision {
            Decision::Advance { mutations, records } => {
                batch.extend(mutations.iter().cloned());
                for r in records {
                    batch.push(Mutation::create(r)?);
                    linked.push(r.uid.clone());
                }
                records
                    .iter()
                    .filter(|r| r.order_type == OrderType::Credit)
                    .count()
            }
            Decision::Credit { credit, .. } => {
                batch.push(Mutation::create(credit)?);
                linked.push(credit.uid.clone());
                1
            }
        };

        self.guard.mark(&order, m, now, &mut batch)?;
        batch.push(Mutation::update(
            DocKind::Orders,
            &order.uid,
            json!({ "linked_transactions": linked }),
        ));

        if let Err(e) = self.ctx.ledger.commit(&batch).await {
            if e.is_conflict() && self.guard.is_consumed(&key).await? {
                debug!(%key, "lost race to a concurrent delivery");
                Counters::bump(&self.counters.duplicates);
                return Ok(ReconcileOutcome::Duplicate);
            }
            warn!(%key, error = %e, "commit rejected");
            return Err(e.into());
        }

        Counters::bump(&self.counters.reconciled);
        for _ in 0..credits {
            Counters::bump(&self.counters.credits_issued);
        }

        let outcome = match decision {
            Decision::Advance { records, .. } => ReconcileOutcome::Reconciled {
                payment: payment_uid,
                records: records.into_iter().map(|r| r.uid).collect(),
            },
            Decision::Credit { reason, credit } => ReconcileOutcome::Credited {
                reason,
                credit: credit.uid,
            },
        };

        info!(order = %order.uid, %outcome, "match reconciled");
        Ok(outcome)
    }
}
