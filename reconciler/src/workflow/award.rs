use corelib::{
    Award, AwardFundPayload, BadgeKind, CreditReason, DocKind, MintAliasPayload, OrderType,
    Payload, PayloadType, StepTarget,
};
use serde_json::json;
use tracing::{debug, info, warn};

use super::records::step;
use super::{HandlerOutcome, MatchInput, WorkflowContext, WorkflowError};
use crate::commit::Mutation;
use crate::output::{OutputRequest, build_output};

/// Funds an award: flips `funded` exactly once and emits the container mint
/// that hosts the award's badge collection.
pub async fn fund(
    ctx: &WorkflowContext,
    input: MatchInput<'_>,
    p: &AwardFundPayload,
) -> Result<HandlerOutcome, WorkflowError> {
    let award: Award = ctx.load(&p.award, input.order).await?;

    if award.funded {
        debug!(award = %award.uid, "award already funded");
        return Ok(HandlerOutcome::rejected(CreditReason::DataNoLongerValid));
    }

    if award.badge.kind == BadgeKind::Native {
        let Some(required) = award.badge.required_native() else {
            return Ok(HandlerOutcome::rejected(CreditReason::InvalidAmount));
        };
        let received = input.m.incoming.to.native_amount(&required);
        if received != required.amount {
            debug!(
                award = %award.uid,
                required = %required.amount,
                received = %received,
                "native reward mismatch"
            );
            return Ok(HandlerOutcome::rejected(CreditReason::InvalidAmount));
        }
    }

    let owner = ctx.wallet.new_address(input.order.network).await?;
    let alias = build_output(
        &OutputRequest::container(owner.clone()).with_amount(p.alias_storage_deposit),
        &ctx.params,
        input.now,
    )?;

    // costs rose since the order was priced
    if alias.amount > p.alias_storage_deposit {
        warn!(
            award = %award.uid,
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
            target: StepTarget::Award(award.uid.clone()),
            next: vec![PayloadType::MintCollection],
        }),
    );

    let update = Mutation::update_if(
        DocKind::Awards,
        &award.uid,
        json!({
            "funded": true,
            "funded_by": input.order.member,
            "funding_address": input.payer(),
        }),
        "funded",
        json!(false),
    );

    info!(award = %award.uid, step = %next.uid, "award funded");
    Ok(HandlerOutcome::fulfilled(vec![update], vec![next]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestEnv, award, award_fund_order, match_for, tok};
    use crate::output::CostParameters;
    use crate::workflow::Disposition;
    use corelib::Document;

    #[tokio::test]
    async fn funds_base_award_and_emits_alias_mint() {
        let env = TestEnv::new();
        let a = award("aw1", BadgeKind::Base, false);
        env.seed(&a).await;

        let order = award_fund_order("o1", "aw1");
        let m = match_for(&order, order.terms().unwrap().amount);
        let out = fund(&env.ctx, env.input(&order, &m), unwrap_payload(&order))
            .await
            .unwrap();

        assert_eq!(out.disposition, Disposition::Fulfilled);
        assert_eq!(out.records.len(), 1);
        let Payload::MintAlias(step) = &out.records[0].payload else {
            panic!("expected alias mint");
        };
        assert_eq!(step.target, StepTarget::Award("aw1".into()));
        assert_eq!(step.amount, unwrap_payload(&order).alias_storage_deposit);
        assert_eq!(out.mutations[0].doc.uid, a.uid());
    }

    #[tokio::test]
    async fn reserved_deposit_below_current_cost_is_rejected() {
        let mut env = TestEnv::new();
        env.ctx.params = CostParameters::new(10_000, 1, 10);
        env.seed(&award("aw1", BadgeKind::Base, false)).await;

        let order = award_fund_order("o1", "aw1");
        let m = match_for(&order, order.terms().unwrap().amount);
        let out = fund(&env.ctx, env.input(&order, &m), unwrap_payload(&order))
            .await
            .unwrap();

        assert!(matches!(
            out.disposition,
            Disposition::Rejected {
                reason: CreditReason::InvalidAmount,
                ..
            }
        ));
        assert!(out.records.is_empty() && out.mutations.is_empty());
    }

    #[tokio::test]
    async fn funded_award_is_no_longer_valid() {
        let env = TestEnv::new();
        env.seed(&award("aw1", BadgeKind::Base, true)).await;

        let order = award_fund_order("o1", "aw1");
        let m = match_for(&order, order.terms().unwrap().amount);
        let out = fund(&env.ctx, env.input(&order, &m), unwrap_payload(&order))
            .await
            .unwrap();

        assert!(matches!(
            out.disposition,
            Disposition::Rejected {
                reason: CreditReason::DataNoLongerValid,
                ..
            }
        ));
        assert!(out.records.is_empty() && out.mutations.is_empty());
    }

    #[tokio::test]
    async fn native_award_requires_exact_reward_total() {
        let env = TestEnv::new();
        // 5 badges x 20 = 100 units of 0xtoken
        env.seed(&award("aw1", BadgeKind::Native, false)).await;

        let order = award_fund_order("o1", "aw1");
        let mut m = match_for(&order, order.terms().unwrap().amount);

        m.incoming.to.native_tokens = vec![tok("0xtoken", 99)];
        let out = fund(&env.ctx, env.input(&order, &m), unwrap_payload(&order))
            .await
            .unwrap();
        assert!(matches!(
            out.disposition,
            Disposition::Rejected {
                reason: CreditReason::InvalidAmount,
                ..
            }
        ));

        m.incoming.to.native_tokens = vec![tok("0xtoken", 100)];
        let out = fund(&env.ctx, env.input(&order, &m), unwrap_payload(&order))
            .await
            .unwrap();
        assert_eq!(out.disposition, Disposition::Fulfilled);
    }

    #[tokio::test]
    async fn missing_award_is_a_precondition_error() {
        let env = TestEnv::new();
        let order = award_fund_order("o1", "ghost");
        let m = match_for(&order, order.terms().unwrap().amount);

        let err = fund(&env.ctx, env.input(&order, &m), unwrap_payload(&order))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::MissingDocument { .. }));
    }

    fn unwrap_payload(order: &corelib::Order) -> &AwardFundPayload {
        match &order.payload {
            Payload::AwardFund(p) => p,
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
