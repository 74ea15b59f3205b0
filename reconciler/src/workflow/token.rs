use corelib::{CreditReason, DocKind, MintTokenPayload, OrderType, Payload, Token, TokenStatus};
use serde_json::json;
use tracing::{debug, info};

use super::records::step;
use super::{HandlerOutcome, MatchInput, WorkflowContext, WorkflowError};
use crate::commit::Mutation;

/// Moves an available token to MINTING and queues the mint step carrying the
/// container, foundry, vault and guardian deposits.
pub async fn mint(
    ctx: &WorkflowContext,
    input: MatchInput<'_>,
    p: &MintTokenPayload,
) -> Result<HandlerOutcome, WorkflowError> {
    let token: Token = ctx.load(&p.token, input.order).await?;

    if token.status != TokenStatus::Available {
        debug!(token = %token.uid, status = ?token.status, "token not mintable");
        return Ok(HandlerOutcome::rejected(CreditReason::DataNoLongerValid));
    }

    let next = step(&input, OrderType::MintToken, Payload::MintToken(p.clone()));

    let update = Mutation::update_if(
        DocKind::Tokens,
        &token.uid,
        json!({ "status": TokenStatus::Minting }),
        "status",
        json!(TokenStatus::Available),
    );

    info!(token = %token.uid, step = %next.uid, "token minting started");
    Ok(HandlerOutcome::fulfilled(vec![update], vec![next]))
}
