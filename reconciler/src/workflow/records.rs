//! Builders for the order records a match leaves behind: the payment audit
//! record, credits, bill payments and follow-up workflow steps.
//!
//! Settlement records (payment, credit, bill payment) are reconciled on
//! creation. Steps stay open until the wallet layer executes them.

use corelib::{
    Address, BillPaymentPayload, CreditPayload, CreditReason, CreditResponse, Match, NativeToken,
    NftId, Order, OrderType, Payload, PaymentPayload,
};

use super::context::MatchInput;

pub fn new_uid() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn record(order: &Order, order_type: OrderType, payload: Payload, sources: Vec<String>, now: u64) -> Order {
    Order {
        uid: new_uid(),
        order_type,
        network: order.network,
        member: order.member.clone(),
        space: order.space.clone(),
        payload,
        reconciled: true,
        void: false,
        source_transaction: sources,
        linked_transactions: vec![],
        created_on: now,
    }
}

/// Audit record of what arrived for `order`.
pub fn payment_record(order: &Order, m: &Match, invalid: bool, now: u64) -> Order {
    let to = &m.incoming.to;
    record(
        order,
        OrderType::Payment,
        Payload::Payment(PaymentPayload {
            amount: to.amount,
            native_tokens: to.native_tokens.clone(),
            nft_id: to.nft_id.clone(),
            source_address: m.incoming.from.clone(),
            target_address: to.address.clone(),
            chain_reference: m.message_id.clone(),
            invalid_payment: invalid,
        }),
        vec![order.uid.clone()],
        now,
    )
}

/// Returns `amount` (plus assets and item, if any) to the payer.
pub fn credit(
    input: &MatchInput<'_>,
    reason: CreditReason,
    amount: u64,
    native_tokens: Vec<NativeToken>,
    nft_id: Option<NftId>,
    response: Option<CreditResponse>,
) -> Order {
    record(
        input.order,
        OrderType::Credit,
        Payload::Credit(CreditPayload {
            amount,
            native_tokens,
            nft_id,
            source_address: input.m.incoming.to.address.clone(),
            target_address: input.payer().clone(),
            reason,
            response,
        }),
        vec![input.order.uid.clone(), input.payment_uid.to_string()],
        input.now,
    )
}

/// Credit of everything the match carried.
pub fn full_refund(
    input: &MatchInput<'_>,
    reason: CreditReason,
    response: Option<CreditResponse>,
) -> Order {
    let to = &input.m.incoming.to;
    credit(
        input,
        reason,
        to.amount,
        to.native_tokens.clone(),
        to.nft_id.clone(),
        response,
    )
}

pub fn bill_payment(input: &MatchInput<'_>, amount: u64, target: Address, royalty: bool) -> Order {
    record(
        input.order,
        OrderType::BillPayment,
        Payload::BillPayment(BillPaymentPayload {
            amount,
            source_address: input.m.incoming.to.address.clone(),
            target_address: target,
            royalty,
        }),
        vec![input.order.uid.clone(), input.payment_uid.to_string()],
        input.now,
    )
}

/// Open follow-up step of the workflow.
pub fn step(input: &MatchInput<'_>, order_type: OrderType, payload: Payload) -> Order {
    let mut o = record(
        input.order,
        order_type,
        payload,
        vec![input.order.uid.clone(), input.payment_uid.to_string()],
        input.now,
    );
    o.reconciled = false;
    o
}
