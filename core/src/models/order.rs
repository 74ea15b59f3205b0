use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::document::{DocKind, Document};
use super::ledger::{Address, AliasId, MessageId, NativeToken, Network, NftId, TokenId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Order,
    Payment,
    Credit,
    BillPayment,
    MintAlias,
    MintCollection,
    MintNft,
    MintToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationType {
    /// Any amount at the expected address is accepted.
    Address,
    /// Amount must equal the order amount (or reach `minimum_amount`).
    AddressAndAmount,
}

/// Reason carried by a credit. Stable wire names; surfaced to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditReason {
    InvalidAmount,
    InvalidPayment,
    DataNoLongerValid,
    NotGovernor,
    NotCompliant,
    /// Overpayment the workflow could not consume.
    ExcessAmount,
    /// Proof-of-control payment handed back after a completed workflow.
    Returned,
}

impl CreditReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditReason::InvalidAmount => "INVALID_AMOUNT",
            CreditReason::InvalidPayment => "INVALID_PAYMENT",
            CreditReason::DataNoLongerValid => "DATA_NO_LONGER_VALID",
            CreditReason::NotGovernor => "NOT_GOVERNOR",
            CreditReason::NotCompliant => "NOT_COMPLIANT",
            CreditReason::ExcessAmount => "EXCESS_AMOUNT",
            CreditReason::Returned => "RETURNED",
        }
    }
}

impl fmt::Display for CreditReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the payer must send for an order to be fulfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTerms {
    pub target_address: Address,
    pub amount: u64,
    /// Floor for variable-cost flows; replaces exact-amount matching.
    #[serde(default)]
    pub minimum_amount: Option<u64>,
    pub validation_type: ValidationType,
    #[serde(default)]
    pub expected_native: Option<NativeToken>,
    #[serde(default)]
    pub expires_on: Option<u64>,
}

/// Discriminant of [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayloadType {
    AwardFund,
    DepositNft,
    MintCollection,
    MintToken,
    Stamp,
    ImportToken,
    MintMetadataNft,
    MintAlias,
    MintNft,
    Payment,
    Credit,
    BillPayment,
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PayloadType::AwardFund => "AWARD_FUND",
            PayloadType::DepositNft => "DEPOSIT_NFT",
            PayloadType::MintCollection => "MINT_COLLECTION",
            PayloadType::MintToken => "MINT_TOKEN",
            PayloadType::Stamp => "STAMP",
            PayloadType::ImportToken => "IMPORT_TOKEN",
            PayloadType::MintMetadataNft => "MINT_METADATA_NFT",
            PayloadType::MintAlias => "MINT_ALIAS",
            PayloadType::MintNft => "MINT_NFT",
            PayloadType::Payment => "PAYMENT",
            PayloadType::Credit => "CREDIT",
            PayloadType::BillPayment => "BILL_PAYMENT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardFundPayload {
    pub terms: PaymentTerms,
    pub award: String,
    pub alias_storage_deposit: u64,
    pub collection_storage_deposit: u64,
    pub nfts_storage_deposit: u64,
    /// Base-currency rewards for BASE badges, zero otherwise.
    #[serde(default)]
    pub base_reward: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositNftPayload {
    pub terms: PaymentTerms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintCollectionPayload {
    pub terms: PaymentTerms,
    pub collection: String,
    pub alias_storage_deposit: u64,
    pub collection_storage_deposit: u64,
    pub nfts_storage_deposit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintTokenPayload {
    pub terms: PaymentTerms,
    pub token: String,
    pub alias_storage_deposit: u64,
    pub foundry_storage_deposit: u64,
    pub vault_storage_deposit: u64,
    pub guardian_storage_deposit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampPayload {
    pub terms: PaymentTerms,
    pub stamp: String,
    /// Size of the stamped content; drives the daily fee.
    pub bytes: u64,
    #[serde(default)]
    pub alias_id: Option<AliasId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTokenPayload {
    pub terms: PaymentTerms,
    pub token_id: TokenId,
    pub space: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataNftPayload {
    pub terms: PaymentTerms,
    pub nft: String,
    pub collection: String,
    /// Metadata blob written into the collectible, UTF-8 JSON.
    pub metadata: String,
    #[serde(default)]
    pub alias_id: Option<AliasId>,
    #[serde(default)]
    pub collection_id: Option<NftId>,
}

/// Business record a mint step ultimately serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "uid", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepTarget {
    Award(String),
    Collection(String),
    Token(String),
    Stamp(String),
    MetadataNft(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintAliasPayload {
    pub amount: u64,
    pub owner: Address,
    pub target: StepTarget,
    /// Steps the wallet layer runs once the container is confirmed.
    #[serde(default)]
    pub next: Vec<PayloadType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintNftPayload {
    pub amount: u64,
    pub owner: Address,
    pub target: StepTarget,
    #[serde(default)]
    pub collection_id: Option<NftId>,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub unlock_at: Option<u64>,
}

/// Audit record of funds received for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub amount: u64,
    #[serde(default)]
    pub native_tokens: Vec<NativeToken>,
    #[serde(default)]
    pub nft_id: Option<NftId>,
    pub source_address: Address,
    pub target_address: Address,
    pub chain_reference: MessageId,
    #[serde(default)]
    pub invalid_payment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditResponse {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditPayload {
    pub amount: u64,
    #[serde(default)]
    pub native_tokens: Vec<NativeToken>,
    #[serde(default)]
    pub nft_id: Option<NftId>,
    pub source_address: Address,
    pub target_address: Address,
    pub reason: CreditReason,
    #[serde(default)]
    pub response: Option<CreditResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillPaymentPayload {
    pub amount: u64,
    pub source_address: Address,
    pub target_address: Address,
    #[serde(default)]
    pub royalty: bool,
}

/// Typed order payload. Exactly one variant is active per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Payload {
    AwardFund(AwardFundPayload),
    DepositNft(DepositNftPayload),
    MintCollection(MintCollectionPayload),
    MintToken(MintTokenPayload),
    Stamp(StampPayload),
    ImportToken(ImportTokenPayload),
    MintMetadataNft(MetadataNftPayload),
    MintAlias(MintAliasPayload),
    MintNft(MintNftPayload),
    Payment(PaymentPayload),
    Credit(CreditPayload),
    BillPayment(BillPaymentPayload),
}

impl Payload {
    pub fn payload_type(&self) -> PayloadType {
        match self {
            Payload::AwardFund(_) => PayloadType::AwardFund,
            Payload::DepositNft(_) => PayloadType::DepositNft,
            Payload::MintCollection(_) => PayloadType::MintCollection,
            Payload::MintToken(_) => PayloadType::MintToken,
            Payload::Stamp(_) => PayloadType::Stamp,
            Payload::ImportToken(_) => PayloadType::ImportToken,
            Payload::MintMetadataNft(_) => PayloadType::MintMetadataNft,
            Payload::MintAlias(_) => PayloadType::MintAlias,
            Payload::MintNft(_) => PayloadType::MintNft,
            Payload::Payment(_) => PayloadType::Payment,
            Payload::Credit(_) => PayloadType::Credit,
            Payload::BillPayment(_) => PayloadType::BillPayment,
        }
    }

    /// Payment terms of payable payloads; `None` for steps and settlement records.
    pub fn terms(&self) -> Option<&PaymentTerms> {
        match self {
            Payload::AwardFund(p) => Some(&p.terms),
            Payload::DepositNft(p) => Some(&p.terms),
            Payload::MintCollection(p) => Some(&p.terms),
            Payload::MintToken(p) => Some(&p.terms),
            Payload::Stamp(p) => Some(&p.terms),
            Payload::ImportToken(p) => Some(&p.terms),
            Payload::MintMetadataNft(p) => Some(&p.terms),
            Payload::MintAlias(_)
            | Payload::MintNft(_)
            | Payload::Payment(_)
            | Payload::Credit(_)
            | Payload::BillPayment(_) => None,
        }
    }

    /// Sub-amounts that must add up to the order total, when the payload has any.
    pub fn sub_amounts(&self) -> Option<Vec<u64>> {
        match self {
            Payload::AwardFund(p) => Some(vec![
                p.alias_storage_deposit,
                p.collection_storage_deposit,
                p.nfts_storage_deposit,
                p.base_reward,
            ]),
            Payload::MintCollection(p) => Some(vec![
                p.alias_storage_deposit,
                p.collection_storage_deposit,
                p.nfts_storage_deposit,
            ]),
            Payload::MintToken(p) => Some(vec![
                p.alias_storage_deposit,
                p.foundry_storage_deposit,
                p.vault_storage_deposit,
                p.guardian_storage_deposit,
            ]),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderInvariantError {
    #[error("sub-amounts of order {uid} sum to {sum}, expected {amount}")]
    SubAmountMismatch { uid: String, sum: u64, amount: u64 },

    #[error("sub-amounts of order {uid} overflow")]
    Overflow { uid: String },
}

/// Order (transaction) record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub uid: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub network: Network,
    #[serde(default)]
    pub member: Option<String>,
    #[serde(default)]
    pub space: Option<String>,
    pub payload: Payload,
    #[serde(default)]
    pub reconciled: bool,
    #[serde(default)]
    pub void: bool,
    #[serde(default)]
    pub source_transaction: Vec<String>,
    #[serde(default)]
    pub linked_transactions: Vec<String>,
    pub created_on: u64,
}

impl Order {
    pub fn terms(&self) -> Option<&PaymentTerms> {
        self.payload.terms()
    }

    /// Declared sub-amounts must sum to the order amount.
    pub fn check_amounts(&self) -> Result<(), OrderInvariantError> {
        let (Some(parts), Some(terms)) = (self.payload.sub_amounts(), self.terms()) else {
            return Ok(());
        };

        let sum = parts
            .iter()
            .try_fold(0u64, |acc, v| acc.checked_add(*v))
            .ok_or_else(|| OrderInvariantError::Overflow {
                uid: self.uid.clone(),
            })?;

        if sum != terms.amount {
            return Err(OrderInvariantError::SubAmountMismatch {
                uid: self.uid.clone(),
                sum,
                amount: terms.amount,
            });
        }
        Ok(())
    }
}

impl Document for Order {
    const KIND: DocKind = DocKind::Orders;

    fn uid(&self) -> &str {
        &self.uid
    }
}
