//! Match validation against an order's payment terms.
//!
//! Pure and synchronous. A rejection is not an error: its reason flows
//! unchanged into the credit that returns the value to the payer.

use corelib::{CreditReason, Match, Order, ValidationType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(CreditReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Checks `m` against the terms of `order`.
///
/// Expiry is judged on the ledger confirmation time of the match, so a
/// payment confirmed in time stays valid however late it is processed.
pub fn validate(order: &Order, m: &Match) -> Verdict {
    let Some(terms) = order.terms() else {
        return Verdict::Rejected(CreditReason::InvalidPayment);
    };
    let to = &m.incoming.to;

    if to.address != terms.target_address {
        return Verdict::Rejected(CreditReason::InvalidPayment);
    }

    if order.void || terms.expires_on.is_some_and(|exp| m.timestamp > exp) {
        return Verdict::Rejected(CreditReason::DataNoLongerValid);
    }

    if terms.validation_type == ValidationType::AddressAndAmount {
        let amount_ok = match terms.minimum_amount {
            Some(min) => to.amount >= min,
            None => to.amount == terms.amount,
        };
        if !amount_ok {
            return Verdict::Rejected(CreditReason::InvalidAmount);
        }
    }

    match &terms.expected_native {
        Some(expected) => {
            if !to.native_tokens.iter().any(|t| t.id == expected.id) {
                return Verdict::Rejected(CreditReason::InvalidPayment);
            }
            if to.native_amount(expected) != expected.amount {
                return Verdict::Rejected(CreditReason::InvalidAmount);
            }
        }
        None if terms.validation_type == ValidationType::AddressAndAmount
            && !to.native_tokens.is_empty() =>
        {
            return Verdict::Rejected(CreditReason::InvalidPayment);
        }
        None => {}
    }

    Verdict::Accepted
}
