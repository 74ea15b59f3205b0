use corelib::{
    CreditReason, CreditResponse, ImportTokenPayload, Token, TokenMinting, TokenStatus,
};
use serde_json::json;
use tracing::{info, warn};

use super::metadata::Irc30;
use super::records::full_refund;
use super::{HandlerOutcome, MatchInput, WorkflowContext, WorkflowError};
use crate::client::LedgerError;
use crate::commit::Mutation;

pub const CODE_IMPORTED: u16 = 200;
pub const CODE_NOT_FOUND: u16 = 2001;
pub const CODE_NOT_GOVERNOR: u16 = 2002;
pub const CODE_NOT_COMPLIANT: u16 = 2003;
pub const CODE_ALREADY_IMPORTED: u16 = 2004;

fn response(code: u16, message: impl Into<String>) -> Option<CreditResponse> {
    Some(CreditResponse {
        code,
        message: message.into(),
    })
}

fn reject(reason: CreditReason, code: u16, message: impl Into<String>) -> HandlerOutcome {
    HandlerOutcome::rejected_with(reason, response(code, message))
}

/// Imports a natively minted asset. The payment only proves control of the
/// asset's container governor, so it is returned in every outcome; the
/// credit's response tells the caller what happened.
pub async fn import_token(
    ctx: &WorkflowContext,
    input: MatchInput<'_>,
    p: &ImportTokenPayload,
) -> Result<HandlerOutcome, WorkflowError> {
    let foundry = match ctx.client.foundry_output(&p.token_id).await {
        Ok(f) => f,
        Err(LedgerError::NotFound(what)) => {
            warn!(token_id = %p.token_id, "no foundry on ledger");
            return Ok(reject(CreditReason::NotCompliant, CODE_NOT_FOUND, what));
        }
        Err(e) => return Err(e.into()),
    };

    let Some(alias_id) = foundry.owner.as_alias().cloned() else {
        return Ok(reject(
            CreditReason::NotCompliant,
            CODE_NOT_COMPLIANT,
            "foundry is not controlled by a container",
        ));
    };

    let alias = match ctx.client.alias_output(&alias_id).await {
        Ok(a) => a,
        Err(LedgerError::NotFound(what)) => {
            return Ok(reject(CreditReason::NotCompliant, CODE_NOT_FOUND, what));
        }
        Err(e) => return Err(e.into()),
    };

    let governor = alias.governor.as_ref().unwrap_or(&alias.owner);
    if governor != input.payer() {
        warn!(token_id = %p.token_id, payer = %input.payer(), "payer is not the governor");
        return Ok(reject(
            CreditReason::NotGovernor,
            CODE_NOT_GOVERNOR,
            "only the container governor can import",
        ));
    }

    let meta = match Irc30::parse(foundry.metadata.as_deref()) {
        Ok(m) => m,
        Err(e) => {
            return Ok(reject(
                CreditReason::NotCompliant,
                CODE_NOT_COMPLIANT,
                e.to_string(),
            ));
        }
    };

    let existing = ctx
        .ledger
        .find_one::<Token>("minting.token_id", &json!(p.token_id.as_str()))
        .await?;
    if existing.is_some() {
        return Ok(reject(
            CreditReason::DataNoLongerValid,
            CODE_ALREADY_IMPORTED,
            "token already imported",
        ));
    }

    let Some(scheme) = foundry.token_scheme.clone() else {
        return Ok(reject(
            CreditReason::NotCompliant,
            CODE_NOT_COMPLIANT,
            "foundry has no token scheme",
        ));
    };

    let token = Token {
        uid: p.token_id.as_str().to_string(),
        space: p.space.clone(),
        name: meta.name,
        symbol: meta.symbol.to_uppercase(),
        decimals: meta.decimals,
        total_supply: scheme.maximum,
        status: TokenStatus::Minted,
        minting: Some(TokenMinting {
            network: input.order.network,
            alias_id,
            token_id: p.token_id.clone(),
            circulating_supply: scheme.circulating(),
            minted_by: input.order.member.clone(),
        }),
        imported: true,
    };

    let returned = full_refund(
        &input,
        CreditReason::Returned,
        response(CODE_IMPORTED, format!("imported {}", token.uid)),
    );

    info!(token = %token.uid, "token imported");
    Ok(HandlerOutcome::fulfilled(
        vec![Mutation::create(&token)?],
        vec![returned],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        PAYER, TestEnv, import_order, irc30, ledger_alias, ledger_foundry, match_for,
    };
    use crate::workflow::Disposition;
    use corelib::{Order, Payload};

    fn payload(order: &Order) -> &ImportTokenPayload {
        match &order.payload {
            Payload::ImportToken(p) => p,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    fn rejected_code(out: &HandlerOutcome) -> (CreditReason, u16) {
        match &out.disposition {
            Disposition::Rejected {
                reason,
                response: Some(r),
            } => (*reason, r.code),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn governor_imports_and_gets_payment_back() {
        let env = TestEnv::new();
        env.chain.insert(ledger_alias("0xalias", PAYER));
        env.chain.insert(ledger_foundry("0xtoken", "0xalias", Some(irc30("SOON"))));

        let order = import_order("o1", "0xtoken");
        let m = match_for(&order, 50_000);
        let out = import_token(&env.ctx, env.input(&order, &m), payload(&order))
            .await
            .unwrap();

        assert_eq!(out.disposition, Disposition::Fulfilled);
        assert_eq!(out.mutations[0].data["imported"], true);
        assert_eq!(out.mutations[0].data["symbol"], "SOON");

        let Payload::Credit(c) = &out.records[0].payload else {
            panic!("expected returned credit");
        };
        assert_eq!(c.reason, CreditReason::Returned);
        assert_eq!(c.amount, 50_000);
        assert_eq!(c.response.as_ref().map(|r| r.code), Some(CODE_IMPORTED));
    }

    #[tokio::test]
    async fn non_governor_is_rejected() {
        let env = TestEnv::new();
        env.chain.insert(ledger_alias("0xalias", "0xsomeone-else"));
        env.chain.insert(ledger_foundry("0xtoken", "0xalias", Some(irc30("SOON"))));

        let order = import_order("o1", "0xtoken");
        let m = match_for(&order, 50_000);
        let out = import_token(&env.ctx, env.input(&order, &m), payload(&order))
            .await
            .unwrap();
        assert_eq!(
            rejected_code(&out),
            (CreditReason::NotGovernor, CODE_NOT_GOVERNOR)
        );
    }

    #[tokio::test]
    async fn non_compliant_metadata_is_rejected() {
        let env = TestEnv::new();
        env.chain.insert(ledger_alias("0xalias", PAYER));
        env.chain.insert(ledger_foundry("0xtoken", "0xalias", Some("{}".into())));

        let order = import_order("o1", "0xtoken");
        let m = match_for(&order, 50_000);
        let out = import_token(&env.ctx, env.input(&order, &m), payload(&order))
            .await
            .unwrap();
        assert_eq!(
            rejected_code(&out),
            (CreditReason::NotCompliant, CODE_NOT_COMPLIANT)
        );
    }

    #[tokio::test]
    async fn second_import_is_no_longer_valid() {
        let env = TestEnv::new();
        env.chain.insert(ledger_alias("0xalias", PAYER));
        env.chain.insert(ledger_foundry("0xtoken", "0xalias", Some(irc30("SOON"))));

        let order = import_order("o1", "0xtoken");
        let m = match_for(&order, 50_000);
        let first = import_token(&env.ctx, env.input(&order, &m), payload(&order))
            .await
            .unwrap();
        env.ctx.ledger.commit(&first.mutations).await.unwrap();

        let again = import_token(&env.ctx, env.input(&order, &m), payload(&order))
            .await
            .unwrap();
        assert_eq!(
            rejected_code(&again),
            (CreditReason::DataNoLongerValid, CODE_ALREADY_IMPORTED)
        );
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let env = TestEnv::new();
        let order = import_order("o1", "0xmissing");
        let m = match_for(&order, 50_000);
        let out = import_token(&env.ctx, env.input(&order, &m), payload(&order))
            .await
            .unwrap();
        assert_eq!(
            rejected_code(&out),
            (CreditReason::NotCompliant, CODE_NOT_FOUND)
        );
    }
}
