use corelib::{
    Address, CreditReason, MetadataNftPayload, MintAliasPayload, MintCollectionPayload,
    MintNftPayload, Nft, NftStatus, OrderType, OutputKind, Payload, PayloadType, StepTarget,
};
use tracing::{debug, info, warn};

use super::metadata::Irc27;
use super::records::{credit, step};
use super::{HandlerOutcome, MatchInput, WorkflowContext, WorkflowError};
use crate::commit::Mutation;
use crate::output::{OutputError, OutputRequest, min_storage_cost, storage_deposit};

/// Mints an item carrying caller-supplied metadata.
///
/// Required funds are the item's deposit plus a container and a collection
/// deposit for whichever of the two does not exist yet. Every missing step
/// is queued in chain order (container, collection, item) so each part of
/// the payment lands on a record.
pub async fn mint(
    ctx: &WorkflowContext,
    input: MatchInput<'_>,
    p: &MetadataNftPayload,
) -> Result<HandlerOutcome, WorkflowError> {
    let meta = match Irc27::parse(Some(&p.metadata)) {
        Ok(m) => m,
        Err(e) => {
            warn!(nft = %p.nft, error = %e, "metadata is not compliant");
            return Ok(HandlerOutcome::rejected(CreditReason::NotCompliant));
        }
    };

    if ctx.ledger.get::<Nft>(&p.nft).await?.is_some() {
        debug!(nft = %p.nft, "item already exists");
        return Ok(HandlerOutcome::rejected(CreditReason::DataNoLongerValid));
    }

    let payer = input.payer().clone();

    let mut item = OutputRequest::collectible(payer.clone()).with_metadata(p.metadata.clone());
    if let Some(col) = &p.collection_id {
        item = item.with_issuer(Address::Nft(col.clone()));
    }
    let nft_cost = match min_storage_cost(&item, &ctx.params, input.now) {
        Ok(cost) => cost,
        Err(e) if e.is_schema_violation() => {
            warn!(nft = %p.nft, error = %e, "item cannot be built");
            return Ok(HandlerOutcome::rejected(CreditReason::NotCompliant));
        }
        Err(e) => return Err(e.into()),
    };

    let alias_owner = match &p.alias_id {
        Some(_) => None,
        None => Some(ctx.wallet.new_address(input.order.network).await?),
    };
    let alias_cost = match &alias_owner {
        Some(owner) => storage_deposit(OutputKind::Container, owner, None, &ctx.params)?,
        None => 0,
    };
    let collection_cost = match &p.collection_id {
        Some(_) => 0,
        None => storage_deposit(OutputKind::Collectible, &payer, None, &ctx.params)?,
    };

    let required = [nft_cost, alias_cost, collection_cost]
        .iter()
        .try_fold(0u64, |acc, v| acc.checked_add(*v))
        .ok_or(OutputError::Overflow)?;

    let received = input.received();
    if received < required {
        debug!(nft = %p.nft, received, required, "metadata item underpaid");
        return Ok(HandlerOutcome::rejected(CreditReason::InvalidAmount));
    }

    let mut records = Vec::new();
    let excess = received - required;
    let refund_floor = storage_deposit(OutputKind::Basic, &payer, None, &ctx.params)?;

    // excess below the basic floor rides along on the item itself
    let item_amount = if excess >= refund_floor {
        records.push(credit(
            &input,
            CreditReason::ExcessAmount,
            excess,
            vec![],
            None,
            None,
        ));
        nft_cost
    } else {
        nft_cost + excess
    };

    let target = StepTarget::MetadataNft(p.nft.clone());

    if let Some(owner) = alias_owner {
        let mut next = Vec::new();
        if p.collection_id.is_none() {
            next.push(PayloadType::MintCollection);
        }
        next.push(PayloadType::MintNft);
        records.push(step(
            &input,
            OrderType::MintAlias,
            Payload::MintAlias(MintAliasPayload {
                amount: alias_cost,
                owner,
                target: target.clone(),
                next,
            }),
        ));
    }

    if p.collection_id.is_none() {
        let mut terms = p.terms.clone();
        terms.amount = collection_cost;
        terms.minimum_amount = None;
        records.push(step(
            &input,
            OrderType::MintCollection,
            Payload::MintCollection(MintCollectionPayload {
                terms,
                collection: p.collection.clone(),
                alias_storage_deposit: 0,
                collection_storage_deposit: collection_cost,
                nfts_storage_deposit: 0,
            }),
        ));
    }

    let item_step = step(
        &input,
        OrderType::MintNft,
        Payload::MintNft(MintNftPayload {
            amount: item_amount,
            owner: payer,
            target,
            collection_id: p.collection_id.clone(),
            metadata: Some(p.metadata.clone()),
            unlock_at: None,
        }),
    );
    let step_uid = item_step.uid.clone();
    records.push(item_step);

    let nft = Nft {
        uid: p.nft.clone(),
        collection: p.collection.clone(),
        space: input.order.space.clone().unwrap_or_default(),
        name: meta.name.clone(),
        description: meta.description.clone().unwrap_or_default(),
        media: Some(meta.uri.clone()),
        owner: input.order.member.clone(),
        status: NftStatus::PreMinted,
        hidden: false,
        properties: meta.properties(),
        minting: None,
        deposit: None,
        listing: None,
    };

    info!(nft = %p.nft, step = %step_uid, required, excess, "metadata item queued");
    // a concurrent order for the same item loses at commit
    Ok(HandlerOutcome::fulfilled(vec![Mutation::create(&nft)?], records))
}
