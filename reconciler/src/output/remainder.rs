use std::collections::BTreeMap;

use corelib::{Address, LedgerOutput, NativeToken, TokenId};

use super::builder::build_output;
use super::types::{CostParameters, OutputDescriptor, OutputError, OutputRequest};

/// Change output left after spending `spend` (and `spend_native`) out of
/// `inputs`, owned by `owner`.
///
/// Returns `None` when nothing is left. Balances are conserved exactly:
/// a remainder that cannot carry its own storage deposit is an error
/// rather than being silently rounded up or dropped.
pub fn compute_remainder(
    inputs: &[LedgerOutput],
    spend: u64,
    spend_native: &[NativeToken],
    owner: &Address,
    params: &CostParameters,
) -> Result<Option<OutputDescriptor>, OutputError> {
    let base = inputs
        .iter()
        .try_fold(0u64, |acc, o| acc.checked_add(o.amount))
        .ok_or(OutputError::Overflow)?;

    let mut natives: BTreeMap<TokenId, u128> = BTreeMap::new();
    for t in inputs.iter().flat_map(|o| o.native_tokens.iter()) {
        let slot = natives.entry(t.id.clone()).or_default();
        *slot = slot.checked_add(t.amount).ok_or(OutputError::Overflow)?;
    }

    let base_left = base
        .checked_sub(spend)
        .ok_or(OutputError::InsufficientInputs {
            available: base,
            required: spend,
        })?;

    for t in spend_native {
        let available = natives.get(&t.id).copied().unwrap_or(0);
        let left = available
            .checked_sub(t.amount)
            .ok_or_else(|| OutputError::InsufficientNative {
                token_id: t.id.clone(),
                available,
                required: t.amount,
            })?;
        natives.insert(t.id.clone(), left);
    }

    let native_left: Vec<NativeToken> = natives
        .into_iter()
        .filter(|(_, amount)| *amount > 0)
        .map(|(id, amount)| NativeToken::new(id, amount))
        .collect();

    if base_left == 0 && native_left.is_empty() {
        return Ok(None);
    }

    let req = OutputRequest::basic(owner.clone(), base_left).with_native_tokens(native_left);
    let out = build_output(&req, params, 0)?;

    if out.storage_deposit > base_left {
        return Err(OutputError::DustRemainder {
            amount: base_left,
            minimum: out.storage_deposit,
        });
    }

    Ok(Some(out))
}
