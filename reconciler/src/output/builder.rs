//! Ledger output construction and storage-cost sizing.
//!
//! The ledger charges every output a minimum amount proportional to its
//! serialized size. Builders here compute that size from the output's
//! structure (not from an actual serializer) and raise the requested amount
//! to the floor:
//!
//! `min = byte_cost * (packed_len * factor_data + offset)`
//!
//! Layout summary (bytes):
//! - every output: type 1, amount 8, native asset count 1, 70 per asset
//! - unlock conditions: count 1, address 34, time lock 5, governor 34
//! - feature blocks: count 1, issuer 34, metadata 3 + len

use corelib::{Address, OutputKind};

use super::types::{
    CostParameters, MAX_METADATA_LEN, MAX_NATIVE_TOKENS, OutputDescriptor, OutputError,
    OutputRequest, ZERO_ID,
};

const TYPE_LEN: usize = 1;
const AMOUNT_LEN: usize = 8;
const COUNT_LEN: usize = 1;
const NATIVE_TOKEN_LEN: usize = 38 + 32;
const ID_LEN: usize = 32;
const ADDRESS_UNLOCK_LEN: usize = 1 + Address::PACKED_LEN;
const TIMELOCK_LEN: usize = 1 + 4;
const ISSUER_FEATURE_LEN: usize = 1 + Address::PACKED_LEN;
const METADATA_HEADER_LEN: usize = 1 + 2;
const STATE_INDEX_LEN: usize = 4;
const STATE_METADATA_HEADER_LEN: usize = 2;
const FOUNDRY_COUNTER_LEN: usize = 4;
const SERIAL_LEN: usize = 4;
const TOKEN_SCHEME_LEN: usize = 1 + 3 * 32;

/// Builds a ledger-ready output for `req`, with `amount` raised to the
/// storage floor.
///
/// A time lock is attached only when `unlock_at` is strictly after `now`.
pub fn build_output(
    req: &OutputRequest,
    params: &CostParameters,
    now: u64,
) -> Result<OutputDescriptor, OutputError> {
    check_request(req)?;

    let unlock_at = req.unlock_at.filter(|at| *at > now);
    let len = packed_len(req, unlock_at.is_some())?;
    let storage_deposit = cost_of(len, params)?;

    let identifier = match req.kind {
        OutputKind::Container | OutputKind::Foundry => Some(ZERO_ID.to_string()),
        OutputKind::Basic | OutputKind::Collectible => None,
    };

    let governor = match req.kind {
        OutputKind::Container => Some(req.governor.clone().unwrap_or_else(|| req.owner.clone())),
        _ => None,
    };

    Ok(OutputDescriptor {
        kind: req.kind,
        owner: req.owner.clone(),
        issuer: req.issuer.clone(),
        governor,
        amount: req.amount.max(storage_deposit),
        native_tokens: req.native_tokens.clone(),
        metadata: req.metadata.clone(),
        mutable_metadata: req.mutable_metadata.clone(),
        unlock_at,
        identifier,
        token_scheme: req.token_scheme.clone(),
        storage_deposit,
    })
}

/// Minimum amount an output shaped like `req` must carry.
pub fn min_storage_cost(
    req: &OutputRequest,
    params: &CostParameters,
    now: u64,
) -> Result<u64, OutputError> {
    Ok(build_output(req, params, now)?.storage_deposit)
}

/// Floor of a bare output of `kind` owned by `owner`, optionally carrying
/// immutable metadata. Handlers use it to size follow-up mint steps.
pub fn storage_deposit(
    kind: OutputKind,
    owner: &Address,
    metadata: Option<&str>,
    params: &CostParameters,
) -> Result<u64, OutputError> {
    let mut req = match kind {
        OutputKind::Basic => OutputRequest::basic(owner.clone(), 0),
        OutputKind::Collectible => OutputRequest::collectible(owner.clone()),
        OutputKind::Container => OutputRequest::container(owner.clone()),
        OutputKind::Foundry => OutputRequest::foundry(
            owner.clone(),
            corelib::TokenScheme {
                minted: 0,
                melted: 0,
                maximum: 0,
            },
        ),
    };
    if let Some(m) = metadata {
        req = req.with_metadata(m);
    }
    min_storage_cost(&req, params, 0)
}

fn check_request(req: &OutputRequest) -> Result<(), OutputError> {
    for m in [&req.metadata, &req.mutable_metadata].into_iter().flatten() {
        if m.len() > MAX_METADATA_LEN {
            return Err(OutputError::MetadataTooLarge {
                len: m.len(),
                max: MAX_METADATA_LEN,
            });
        }
    }

    if req.native_tokens.len() > MAX_NATIVE_TOKENS {
        return Err(OutputError::TooManyNativeTokens {
            count: req.native_tokens.len(),
            max: MAX_NATIVE_TOKENS,
        });
    }

    match req.kind {
        OutputKind::Basic if req.issuer.is_some() => Err(OutputError::IssuerNotAllowed),
        OutputKind::Container | OutputKind::Foundry if req.unlock_at.is_some() => {
            Err(OutputError::TimelockNotAllowed(req.kind))
        }
        OutputKind::Foundry if req.owner.as_alias().is_none() => {
            Err(OutputError::FoundryOwnerNotAlias(req.owner.clone()))
        }
        OutputKind::Foundry if req.token_scheme.is_none() => Err(OutputError::MissingTokenScheme),
        _ => Ok(()),
    }
}

fn metadata_len(m: &Option<String>) -> usize {
    m.as_ref().map_or(0, |m| METADATA_HEADER_LEN + m.len())
}

/// Serialized size of the output described by `req`.
pub fn packed_len(req: &OutputRequest, with_timelock: bool) -> Result<usize, OutputError> {
    let natives = req
        .native_tokens
        .len()
        .checked_mul(NATIVE_TOKEN_LEN)
        .ok_or(OutputError::Overflow)?;
    let common = TYPE_LEN + AMOUNT_LEN + COUNT_LEN + natives;
    let timelock = if with_timelock { TIMELOCK_LEN } else { 0 };
    let issuer = req.issuer.as_ref().map_or(0, |_| ISSUER_FEATURE_LEN);

    let body = match req.kind {
        OutputKind::Basic => {
            COUNT_LEN + ADDRESS_UNLOCK_LEN + timelock + COUNT_LEN + metadata_len(&req.metadata)
        }
        OutputKind::Collectible => {
            ID_LEN
                + COUNT_LEN
                + ADDRESS_UNLOCK_LEN
                + timelock
                + COUNT_LEN
                + metadata_len(&req.mutable_metadata)
                + COUNT_LEN
                + issuer
                + metadata_len(&req.metadata)
        }
        OutputKind::Container => {
            let state_metadata = req
                .mutable_metadata
                .as_ref()
                .map_or(0, |m| m.len());
            ID_LEN
                + STATE_INDEX_LEN
                + STATE_METADATA_HEADER_LEN
                + state_metadata
                + FOUNDRY_COUNTER_LEN
                + COUNT_LEN
                + ADDRESS_UNLOCK_LEN // state controller
                + ADDRESS_UNLOCK_LEN // governor
                + COUNT_LEN
                + COUNT_LEN
                + issuer
                + metadata_len(&req.metadata)
        }
        OutputKind::Foundry => {
            SERIAL_LEN
                + TOKEN_SCHEME_LEN
                + COUNT_LEN
                + ADDRESS_UNLOCK_LEN // immutable alias
                + COUNT_LEN
                + metadata_len(&req.mutable_metadata)
                + COUNT_LEN
                + metadata_len(&req.metadata)
        }
    };

    Ok(common + body)
}

fn cost_of(packed_len: usize, params: &CostParameters) -> Result<u64, OutputError> {
    let len = u64::try_from(packed_len).map_err(|_| OutputError::Overflow)?;
    len.checked_mul(params.factor_data)
        .and_then(|v| v.checked_add(params.offset()))
        .and_then(|v| v.checked_mul(params.byte_cost))
        .ok_or(OutputError::Overflow)
}
