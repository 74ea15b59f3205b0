use std::sync::Arc;

use corelib::{Address, Document, Match, Order, PaymentTerms};

use super::WorkflowError;
use crate::client::{LedgerClient, Wallet};
use crate::config::AppConfig;
use crate::ledger::DocRef;
use crate::ledger::store::OrderLedger;
use crate::output::CostParameters;

/// Stamp storage pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampPricing {
    pub daily_cost_per_mb: u64,
    pub max_days: u64,
}

impl Default for StampPricing {
    fn default() -> Self {
        Self {
            daily_cost_per_mb: 104_000,
            max_days: 36_500,
        }
    }
}

/// Collaborators and settings every handler receives explicitly.
#[derive(Clone)]
pub struct WorkflowContext {
    pub ledger: OrderLedger,
    pub client: Arc<dyn LedgerClient>,
    pub wallet: Arc<dyn Wallet>,
    pub params: CostParameters,
    pub stamp_pricing: StampPricing,
    pub royalty_address: Address,
}

impl WorkflowContext {
    pub fn new(
        ledger: OrderLedger,
        client: Arc<dyn LedgerClient>,
        wallet: Arc<dyn Wallet>,
        params: CostParameters,
    ) -> Self {
        Self {
            ledger,
            client,
            wallet,
            params,
            stamp_pricing: StampPricing::default(),
            royalty_address: Address::ed25519("royalty"),
        }
    }

    pub fn with_config(mut self, cfg: &AppConfig) -> Self {
        self.stamp_pricing = StampPricing {
            daily_cost_per_mb: cfg.stamp_daily_cost_per_mb,
            max_days: cfg.stamp_max_days,
        };
        self.royalty_address = cfg.royalty_address.clone();
        self
    }

    /// Loads a document the order references; absence is a precondition
    /// failure, not a business rejection.
    pub async fn load<D: Document>(&self, uid: &str, order: &Order) -> Result<D, WorkflowError> {
        self.ledger
            .get::<D>(uid)
            .await?
            .ok_or_else(|| WorkflowError::MissingDocument {
                doc: DocRef::of::<D>(uid),
                order: order.uid.clone(),
            })
    }
}

/// One validated match on its way through a handler.
#[derive(Debug, Clone, Copy)]
pub struct MatchInput<'a> {
    /// Freshly re-read order, never the matcher's snapshot.
    pub order: &'a Order,
    pub m: &'a Match,
    /// Uid of the payment record created for this match.
    pub payment_uid: &'a str,
    pub now: u64,
}

impl<'a> MatchInput<'a> {
    pub fn terms(&self) -> Result<&'a PaymentTerms, WorkflowError> {
        self.order
            .terms()
            .ok_or(WorkflowError::NotPayable(self.order.payload.payload_type()))
    }

    pub fn payer(&self) -> &'a Address {
        &self.m.incoming.from
    }

    /// Base amount received.
    pub fn received(&self) -> u64 {
        self.m.incoming.to.amount
    }
}
