use corelib::{
    CreditReason, DocKind, MintAliasPayload, MintNftPayload, OrderType, OutputKind, Payload,
    PayloadType, Stamp, StampPayload, StepTarget,
};
use serde_json::json;
use tracing::{debug, info};

use super::records::{bill_payment, credit, step};
use super::{HandlerOutcome, MatchInput, StampPricing, WorkflowContext, WorkflowError};
use crate::commit::Mutation;
use crate::output::{OutputError, OutputRequest, min_storage_cost, storage_deposit};
use crate::time::DAY_MS;

const MIB: u128 = 1_048_576;

/// Storage fee for one day of `bytes`. Never zero, so every stamp pays for
/// at least something.
pub fn daily_fee(bytes: u64, pricing: &StampPricing) -> u64 {
    let fee = u128::from(bytes) * u128::from(pricing.daily_cost_per_mb) / MIB;
    u64::try_from(fee).unwrap_or(u64::MAX).max(1)
}

/// Split of a stamp payment. `build + royalty + refund == received`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampQuote {
    /// Storage deposits of the outputs the stamp needs.
    pub build: u64,
    pub days: u64,
    /// Consumed fee, paid out as royalty.
    pub royalty: u64,
    /// Excess the stamp could not consume, credited back.
    pub refund: u64,
}

/// Prices a stamp. `None` when `received` does not cover the build cost
/// plus one day.
pub fn quote(
    received: u64,
    build: u64,
    fee: u64,
    refund_floor: u64,
    max_days: u64,
) -> Result<Option<StampQuote>, OutputError> {
    let minimum = build.checked_add(fee).ok_or(OutputError::Overflow)?;
    if received < minimum {
        return Ok(None);
    }

    let spare = received - build;
    let days = (spare / fee).min(max_days.max(1));
    let consumed = days * fee;
    let excess = spare - consumed;

    // dust cannot leave as its own output; it is consumed with the fee
    let (royalty, refund) = if excess >= refund_floor {
        (consumed, excess)
    } else {
        (consumed + excess, 0)
    };

    Ok(Some(StampQuote {
        build,
        days,
        royalty,
        refund,
    }))
}

/// Funds a stamp: buys storage days with whatever exceeds the build cost,
/// pays the consumed fee out as royalty and queues the item mint (behind a
/// container mint when the stamp has no reusable container).
pub async fn stamp(
    ctx: &WorkflowContext,
    input: MatchInput<'_>,
    p: &StampPayload,
) -> Result<HandlerOutcome, WorkflowError> {
    let stamp: Stamp = ctx.load(&p.stamp, input.order).await?;
    if stamp.funded {
        debug!(stamp = %stamp.uid, "stamp already funded");
        return Ok(HandlerOutcome::rejected(CreditReason::DataNoLongerValid));
    }

    let payer = input.payer().clone();
    let metadata = json!({
        "checksum": stamp.checksum,
        "bytes": p.bytes,
        "stamp": stamp.uid,
    })
    .to_string();

    let nft_cost = min_storage_cost(
        &OutputRequest::collectible(payer.clone()).with_metadata(metadata.clone()),
        &ctx.params,
        input.now,
    )?;

    let alias_owner = match &p.alias_id {
        Some(_) => None,
        None => Some(ctx.wallet.new_address(input.order.network).await?),
    };
    let alias_cost = match &alias_owner {
        Some(owner) => storage_deposit(OutputKind::Container, owner, None, &ctx.params)?,
        None => 0,
    };

    let build = nft_cost.checked_add(alias_cost).ok_or(OutputError::Overflow)?;
    let fee = daily_fee(p.bytes, &ctx.stamp_pricing);
    let refund_floor = storage_deposit(OutputKind::Basic, &payer, None, &ctx.params)?;

    let Some(q) = quote(
        input.received(),
        build,
        fee,
        refund_floor,
        ctx.stamp_pricing.max_days,
    )?
    else {
        debug!(
            stamp = %stamp.uid,
            received = input.received(),
            minimum = build.saturating_add(fee),
            "stamp underpaid"
        );
        return Ok(HandlerOutcome::rejected(CreditReason::InvalidAmount));
    };

    let mut records = Vec::new();

    if q.refund > 0 {
        records.push(credit(
            &input,
            CreditReason::ExcessAmount,
            q.refund,
            vec![],
            None,
            None,
        ));
    }

    records.push(bill_payment(
        &input,
        q.royalty,
        ctx.royalty_address.clone(),
        true,
    ));

    if let Some(owner) = alias_owner {
        records.push(step(
            &input,
            OrderType::MintAlias,
            Payload::MintAlias(MintAliasPayload {
                amount: alias_cost,
                owner,
                target: StepTarget::Stamp(stamp.uid.clone()),
                next: vec![PayloadType::MintNft],
            }),
        ));
    }

    records.push(step(
        &input,
        OrderType::MintNft,
        Payload::MintNft(MintNftPayload {
            amount: nft_cost,
            owner: payer,
            target: StepTarget::Stamp(stamp.uid.clone()),
            collection_id: None,
            metadata: Some(metadata),
            unlock_at: None,
        }),
    ));

    let expires_at = q
        .days
        .checked_mul(DAY_MS)
        .and_then(|d| d.checked_add(input.now))
        .ok_or(OutputError::Overflow)?;

    let update = Mutation::update_if(
        DocKind::Stamps,
        &stamp.uid,
        json!({
            "funded": true,
            "days": q.days,
            "expires_at": expires_at,
            "order": input.order.uid,
            "alias_id": p.alias_id,
        }),
        "funded",
        json!(false),
    );

    info!(
        stamp = %stamp.uid,
        days = q.days,
        royalty = q.royalty,
        refund = q.refund,
        "stamp funded"
    );
    Ok(HandlerOutcome::fulfilled(vec![update], records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestEnv, match_for, stamp_doc, stamp_order};
    use crate::workflow::Disposition;
    use corelib::{AliasId, Order};
    use proptest::prelude::*;

    fn payload(order: &Order) -> &StampPayload {
        match &order.payload {
            Payload::Stamp(p) => p,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn fee_is_never_zero() {
        let pricing = StampPricing {
            daily_cost_per_mb: 100,
            max_days: 10,
        };
        assert_eq!(daily_fee(1, &pricing), 1);
        assert_eq!(daily_fee(1_048_576, &pricing), 100);
        assert_eq!(daily_fee(3 * 1_048_576, &pricing), 300);
    }

    #[test]
    fn quote_caps_days_and_refunds_excess() {
        // build 1000, fee 10/day, max 5 days -> 50 consumed, 450 back
        let q = quote(1_500, 1_000, 10, 100, 5).unwrap().unwrap();
        assert_eq!(q.days, 5);
        assert_eq!(q.royalty, 50);
        assert_eq!(q.refund, 450);
    }

    #[test]
    fn quote_absorbs_dust() {
        // 3 spare units below a full day and below the refund floor
        let q = quote(1_033, 1_000, 10, 100, 50).unwrap().unwrap();
        assert_eq!(q.days, 3);
        assert_eq!(q.royalty, 33);
        assert_eq!(q.refund, 0);
    }

    #[test]
    fn quote_rejects_underpayment() {
        assert_eq!(quote(1_009, 1_000, 10, 100, 5).unwrap(), None);
    }

    proptest! {
        #[test]
        fn quote_conserves_value(
            received in 0u64..10_000_000,
            build in 0u64..1_000_000,
            fee in 1u64..10_000,
            floor in 0u64..100_000,
            max_days in 0u64..1_000,
        ) {
            if let Some(q) = quote(received, build, fee, floor, max_days).unwrap() {
                prop_assert_eq!(q.build + q.royalty + q.refund, received);
                prop_assert!(q.days >= 1);
                prop_assert!(q.refund == 0 || q.refund >= floor);
            }
        }
    }

    #[tokio::test]
    async fn stamp_without_container_emits_alias_and_item_mints() {
        let env = TestEnv::new();
        env.seed(&stamp_doc("st1")).await;

        let order = stamp_order("o1", "st1", 1_000, None);
        let m = match_for(&order, 2_000_000);
        let out = stamp(&env.ctx, env.input(&order, &m), payload(&order))
            .await
            .unwrap();

        assert_eq!(out.disposition, Disposition::Fulfilled);
        let types: Vec<OrderType> = out.records.iter().map(|r| r.order_type).collect();
        assert!(types.contains(&OrderType::BillPayment));
        assert!(types.contains(&OrderType::MintAlias));
        assert!(types.contains(&OrderType::MintNft));

        // everything received is accounted for
        let mut total = 0;
        for r in &out.records {
            total += match &r.payload {
                Payload::Credit(c) => c.amount,
                Payload::BillPayment(b) => b.amount,
                Payload::MintAlias(a) => a.amount,
                Payload::MintNft(n) => n.amount,
                other => panic!("unexpected record {other:?}"),
            };
        }
        assert_eq!(total, 2_000_000);
    }

    #[tokio::test]
    async fn reusable_container_skips_alias_mint() {
        let env = TestEnv::new();
        env.seed(&stamp_doc("st1")).await;

        let order = stamp_order("o1", "st1", 1_000, Some(AliasId::new("0xalias")));
        let m = match_for(&order, 2_000_000);
        let out = stamp(&env.ctx, env.input(&order, &m), payload(&order))
            .await
            .unwrap();

        assert!(out.records.iter().all(|r| r.order_type != OrderType::MintAlias));
        assert_eq!(out.mutations[0].data["alias_id"], "0xalias");
    }

    #[tokio::test]
    async fn underpaid_stamp_is_invalid_amount() {
        let env = TestEnv::new();
        env.seed(&stamp_doc("st1")).await;

        let order = stamp_order("o1", "st1", 1_000, None);
        let m = match_for(&order, 1_000);
        let out = stamp(&env.ctx, env.input(&order, &m), payload(&order))
            .await
            .unwrap();

        assert!(matches!(
            out.disposition,
            Disposition::Rejected {
                reason: CreditReason::InvalidAmount,
                ..
            }
        ));
    }
}
