use corelib::{
    Address, Collection, CollectionMinting, CollectionStatus, CreditReason, DepositNftPayload,
    DocKind, LedgerOutput, Nft, NftDeposit, NftId, NftMinting, NftStatus, Space, SpaceAlias,
};
use serde_json::json;
use tracing::{debug, info, warn};

use super::metadata::Irc27;
use super::{HandlerOutcome, MatchInput, WorkflowContext, WorkflowError};
use crate::client::LedgerError;
use crate::commit::Mutation;

/// Takes custody of a deposited collectible.
///
/// Items the platform already knows change owner in place. Unknown items are
/// migrated together with their collection and, when no space claims the
/// collection's container yet, a new unclaimed space.
pub async fn deposit_nft(
    ctx: &WorkflowContext,
    input: MatchInput<'_>,
    _p: &DepositNftPayload,
) -> Result<HandlerOutcome, WorkflowError> {
    let Some(nft_id) = input.m.incoming.to.nft_id.clone() else {
        debug!("deposit carried no collectible");
        return Ok(HandlerOutcome::rejected(CreditReason::InvalidPayment));
    };

    let deposit = NftDeposit {
        message_id: input.m.message_id.clone(),
        deposited_on: input.now,
        order: input.order.uid.clone(),
    };

    if let Some(known) = ctx
        .ledger
        .find_one::<Nft>("minting.nft_id", &json!(nft_id.as_str()))
        .await?
    {
        let update = Mutation::update(
            DocKind::Nfts,
            &known.uid,
            json!({
                "owner": input.order.member,
                "status": NftStatus::Minted,
                "hidden": false,
                "listing": null,
                "deposit": deposit,
            }),
        );
        info!(nft = %known.uid, "known item deposited");
        return Ok(HandlerOutcome::fulfilled(vec![update], vec![]));
    }

    match migrate(ctx, &input, &nft_id, deposit).await {
        Ok(mutations) => {
            info!(nft_id = %nft_id, "external item migrated");
            Ok(HandlerOutcome::fulfilled(mutations, vec![]))
        }
        Err(Migration::NotCompliant(why)) => {
            warn!(nft_id = %nft_id, reason = %why, "deposited item is not compliant");
            Ok(HandlerOutcome::rejected(CreditReason::NotCompliant))
        }
        Err(Migration::Failed(e)) => Err(e),
    }
}

enum Migration {
    NotCompliant(String),
    Failed(WorkflowError),
}

impl From<anyhow::Error> for Migration {
    fn from(e: anyhow::Error) -> Self {
        Migration::Failed(e.into())
    }
}

impl From<serde_json::Error> for Migration {
    fn from(e: serde_json::Error) -> Self {
        Migration::Failed(e.into())
    }
}

/// Fetch of an on-ledger output the depositor vouched for. A missing output
/// means the item cannot be migrated; anything else is infrastructure.
async fn fetch<F>(what: &str, fut: F) -> Result<LedgerOutput, Migration>
where
    F: std::future::Future<Output = Result<LedgerOutput, LedgerError>>,
{
    match fut.await {
        Ok(o) => Ok(o),
        Err(LedgerError::NotFound(_)) => Err(Migration::NotCompliant(format!("{what} not on ledger"))),
        Err(e) => Err(Migration::Failed(e.into())),
    }
}

async fn migrate(
    ctx: &WorkflowContext,
    input: &MatchInput<'_>,
    nft_id: &NftId,
    deposit: NftDeposit,
) -> Result<Vec<Mutation>, Migration> {
    let network = input.order.network;
    let output = fetch("item", ctx.client.nft_output(nft_id)).await?;
    let meta = Irc27::parse(output.metadata.as_deref())
        .map_err(|e| Migration::NotCompliant(format!("item metadata: {e}")))?;

    let Some(collection_id) = output.issuer.as_ref().and_then(Address::as_nft).cloned() else {
        return Err(Migration::NotCompliant("item has no collection issuer".into()));
    };

    let mut mutations = Vec::new();

    let existing = ctx
        .ledger
        .find_one::<Collection>("minting.nft_id", &json!(collection_id.as_str()))
        .await?;

    let collection = match existing {
        Some(c) if c.status == CollectionStatus::Rejected => {
            return Err(Migration::NotCompliant("collection was rejected".into()));
        }
        Some(c) => c,
        None => {
            let col_out = fetch("collection", ctx.client.nft_output(&collection_id)).await?;
            let col_meta = Irc27::parse(col_out.metadata.as_deref())
                .map_err(|e| Migration::NotCompliant(format!("collection metadata: {e}")))?;

            let Some(alias_id) = col_out.issuer.as_ref().and_then(Address::as_alias).cloned() else {
                return Err(Migration::NotCompliant("collection has no container issuer".into()));
            };

            let claimed = ctx
                .ledger
                .find_one::<Space>("alias.alias_id", &json!(alias_id.as_str()))
                .await?;

            let space_uid = match claimed {
                Some(space) => space.uid,
                None => {
                    let alias_out = fetch("container", ctx.client.alias_output(&alias_id)).await?;
                    // keyed by container so concurrent migrations collide
                    let space = Space {
                        uid: alias_id.as_str().to_string(),
                        name: col_meta
                            .issuer_name
                            .clone()
                            .unwrap_or_else(|| col_meta.name.clone()),
                        alias: Some(SpaceAlias {
                            alias_id: alias_id.clone(),
                            network,
                            governor: Some(alias_out.governor.unwrap_or(alias_out.owner)),
                        }),
                        claimed: false,
                    };
                    mutations.push(Mutation::create(&space)?);
                    space.uid
                }
            };

            let share: f64 = col_meta.royalties.values().sum();
            let collection = Collection {
                uid: collection_id.as_str().to_string(),
                space: space_uid,
                name: col_meta.name,
                description: col_meta.description.unwrap_or_default(),
                status: CollectionStatus::Minted,
                royalties_fee_bps: (share * 10_000.0).round() as u32,
                royalties_space: None,
                minting: Some(CollectionMinting {
                    network,
                    minted_by: None,
                    nft_id: Some(collection_id.clone()),
                    alias_id: Some(alias_id),
                    address: None,
                }),
                total: 0,
                migrated: true,
            };
            mutations.push(Mutation::create(&collection)?);
            collection
        }
    };

    let properties = meta.properties();
    let nft = Nft {
        uid: nft_id.as_str().to_string(),
        collection: collection.uid.clone(),
        space: collection.space.clone(),
        name: meta.name,
        description: meta.description.unwrap_or_default(),
        media: Some(meta.uri),
        owner: input.order.member.clone(),
        status: NftStatus::Minted,
        hidden: false,
        properties,
        minting: Some(NftMinting {
            network,
            nft_id: nft_id.clone(),
            address: Some(input.m.incoming.to.address.clone()),
            minted_by: None,
        }),
        deposit: Some(deposit),
        listing: None,
    };
    mutations.push(Mutation::create(&nft)?);
    mutations.push(Mutation::increment(
        DocKind::Collections,
        &collection.uid,
        "total",
        1,
    ));

    Ok(mutations)
}
