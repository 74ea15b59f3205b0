//! Workflow handlers: one per payable payload, selected by an exhaustive
//! match on [`Payload`].
//!
//! Handlers decide; they never write. Each returns a [`HandlerOutcome`] with
//! business document mutations and follow-up order records, which the
//! processor commits together with the payment record and the guard mark.

pub mod award;
pub mod collection;
pub mod context;
pub mod deposit;
pub mod import;
pub mod metadata;
pub mod metadata_nft;
pub mod records;
pub mod stamp;
pub mod token;

use corelib::{CreditReason, CreditResponse, Order, Payload, PayloadType};
use thiserror::Error;

use crate::client::LedgerError;
use crate::commit::Mutation;
use crate::ledger::DocRef;
use crate::output::OutputError;

pub use context::{MatchInput, StampPricing, WorkflowContext};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0} is not a payable order payload")]
    NotPayable(PayloadType),

    #[error("{doc} referenced by order {order} does not exist")]
    MissingDocument { doc: DocRef, order: String },

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("store read failed: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error("encoding record failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl WorkflowError {
    pub fn is_transient(&self) -> bool {
        match self {
            WorkflowError::Ledger(e) => e.is_transient(),
            WorkflowError::Store(_) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The workflow advanced.
    Fulfilled,
    /// Nothing advanced; everything received goes back to the payer.
    Rejected {
        reason: CreditReason,
        response: Option<CreditResponse>,
    },
}

#[derive(Debug)]
pub struct HandlerOutcome {
    pub disposition: Disposition,
    /// Business document changes.
    pub mutations: Vec<Mutation>,
    /// Follow-up order records: steps, credits, bill payments.
    pub records: Vec<Order>,
}

impl HandlerOutcome {
    pub fn fulfilled(mutations: Vec<Mutation>, records: Vec<Order>) -> Self {
        Self {
            disposition: Disposition::Fulfilled,
            mutations,
            records,
        }
    }

    pub fn rejected(reason: CreditReason) -> Self {
        Self::rejected_with(reason, None)
    }

    pub fn rejected_with(reason: CreditReason, response: Option<CreditResponse>) -> Self {
        Self {
            disposition: Disposition::Rejected { reason, response },
            mutations: vec![],
            records: vec![],
        }
    }
}

/// Runs the handler for the order's payload.
pub async fn handle(
    ctx: &WorkflowContext,
    input: MatchInput<'_>,
) -> Result<HandlerOutcome, WorkflowError> {
    match &input.order.payload {
        Payload::AwardFund(p) => award::fund(ctx, input, p).await,
        Payload::DepositNft(p) => deposit::deposit_nft(ctx, input, p).await,
        Payload::MintCollection(p) => collection::mint(ctx, input, p).await,
        Payload::MintToken(p) => token::mint(ctx, input, p).await,
        Payload::Stamp(p) => stamp::stamp(ctx, input, p).await,
        Payload::ImportToken(p) => import::import_token(ctx, input, p).await,
        Payload::MintMetadataNft(p) => metadata_nft::mint(ctx, input, p).await,
        Payload::MintAlias(_)
        | Payload::MintNft(_)
        | Payload::Payment(_)
        | Payload::Credit(_)
        | Payload::BillPayment(_) => Err(WorkflowError::NotPayable(
            input.order.payload.payload_type(),
        )),
    }
}
