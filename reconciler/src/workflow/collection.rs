use corelib::{
    CollectionStatus, CollectionMinting, CreditReason, DocKind, MintAliasPayload,
    MintCollectionPayload, OrderType, Payload, PayloadType, StepTarget,
};
use serde_json::json;
use tracing::{debug, info, warn};

use super::records::step;
use super::{HandlerOutcome, MatchInput, WorkflowContext, WorkflowError};
use crate::commit::Mutation;
use crate::output::{OutputRequest, build_output};

/// Starts minting a pre-minted collection: the collection moves to MINTING
/// and a container mint is queued, followed by the collection and item mints.
pub async fn mint(
    ctx: &WorkflowContext,
    input: MatchInput<'_>,
    p: &MintCollectionPayload,
) -> Result<HandlerOutcome, WorkflowError> {
    let collection: corelib::Collection = ctx.load(&p.collection, input.order).await?;

    if collection.status != CollectionStatus::PreMinted {
        debug!(collection = %collection.uid, status = ?collection.status, "collection not mintable");
        return Ok(HandlerOutcome::rejected(CreditReason::DataNoLongerValid));
    }

    let network = input.order.network;
    let owner = ctx.wallet.new_address(network).await?;
    let alias = build_output(
        &OutputRequest::container(owner.clone()).with_amount(p.alias_storage_deposit),
        &ctx.params,
        input.now,
    )?;

    // costs rose since the order was priced
    if alias.amount > p.alias_storage_deposit {
        warn!(
            collection = %collection.uid,
            reserved = p.alias_storage_deposit,
            required = alias.amount,
            "reserved container deposit no longer covers the output"
        );
        return Ok(HandlerOutcome::rejected(CreditReason::InvalidAmount));
    }

    let next = step(
        &input,
        OrderType::MintAlias,
        Payload::MintAlias(MintAliasPayload {
            amount: alias.amount,
            owner,
            target: StepTarget::Collection(collection.uid.clone()),
            next: vec![PayloadType::MintCollection, PayloadType::MintNft],
        }),
    );

    let minting = CollectionMinting {
        network,
        minted_by: input.order.member.clone(),
        nft_id: None,
        alias_id: None,
        address: None,
    };
    let update = Mutation::update_if(
        DocKind::Collections,
        &collection.uid,
        json!({
            "status": CollectionStatus::Minting,
            "minting": minting,
        }),
        "status",
        json!(CollectionStatus::PreMinted),
    );

    info!(collection = %collection.uid, step = %next.uid, "collection minting started");
    Ok(HandlerOutcome::fulfilled(vec![update], vec![next]))
}
