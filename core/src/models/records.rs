use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::document::{DocKind, Document};
use super::ledger::{Address, AliasId, MessageId, NativeToken, Network, NftId, TokenId};

macro_rules! document {
    ($ty:ty, $kind:expr) => {
        impl Document for $ty {
            const KIND: DocKind = $kind;

            fn uid(&self) -> &str {
                &self.uid
            }
        }
    };
}

// Awards

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeKind {
    Base,
    Native,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardBadge {
    pub kind: BadgeKind,
    #[serde(default)]
    pub token_id: Option<TokenId>,
    /// Number of badges the award can issue.
    pub total: u64,
    /// Reward per badge, in smallest units of the reward asset.
    #[serde(with = "crate::models::u128_string")]
    pub token_reward: u128,
}

impl AwardBadge {
    /// Native quantity a funder must send for a NATIVE badge; `None` for base
    /// badges or when the product overflows.
    pub fn required_native(&self) -> Option<NativeToken> {
        if self.kind != BadgeKind::Native {
            return None;
        }
        let id = self.token_id.clone()?;
        let amount = self.token_reward.checked_mul(u128::from(self.total))?;
        Some(NativeToken::new(id, amount))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub uid: String,
    pub space: String,
    pub name: String,
    pub network: Network,
    pub badge: AwardBadge,
    #[serde(default)]
    pub funded: bool,
    #[serde(default)]
    pub funded_by: Option<String>,
    #[serde(default)]
    pub funding_address: Option<Address>,
    #[serde(default)]
    pub alias_id: Option<AliasId>,
    #[serde(default)]
    pub issued: u64,
}
document!(Award, DocKind::Awards);

// Collections & items

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionStatus {
    PreMinted,
    Minting,
    Minted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMinting {
    pub network: Network,
    #[serde(default)]
    pub minted_by: Option<String>,
    #[serde(default)]
    pub nft_id: Option<NftId>,
    #[serde(default)]
    pub alias_id: Option<AliasId>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub uid: String,
    pub space: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: CollectionStatus,
    /// Royalty share in basis points.
    #[serde(default)]
    pub royalties_fee_bps: u32,
    #[serde(default)]
    pub royalties_space: Option<String>,
    #[serde(default)]
    pub minting: Option<CollectionMinting>,
    #[serde(default)]
    pub total: u64,
    /// Created from an externally minted collection rather than on this platform.
    #[serde(default)]
    pub migrated: bool,
}
document!(Collection, DocKind::Collections);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NftStatus {
    PreMinted,
    Minted,
    Withdrawn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftMinting {
    pub network: Network,
    pub nft_id: NftId,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub minted_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftDeposit {
    pub message_id: MessageId,
    pub deposited_on: u64,
    pub order: String,
}

/// Secondary-market listing. `None` means "not listed"; a stored `null` and a
/// missing field are the same state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub price: u64,
    pub available_from: u64,
    #[serde(default)]
    pub auction_to: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nft {
    pub uid: String,
    pub collection: String,
    pub space: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub media: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    pub status: NftStatus,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub minting: Option<NftMinting>,
    #[serde(default)]
    pub deposit: Option<NftDeposit>,
    #[serde(default)]
    pub listing: Option<Listing>,
}
document!(Nft, DocKind::Nfts);

// Spaces

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceAlias {
    pub alias_id: AliasId,
    pub network: Network,
    #[serde(default)]
    pub governor: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub alias: Option<SpaceAlias>,
    /// False for spaces materialized from on-ledger data until a governor claims them.
    #[serde(default)]
    pub claimed: bool,
}
document!(Space, DocKind::Spaces);

// Tokens

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStatus {
    Available,
    Minting,
    Minted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMinting {
    pub network: Network,
    pub alias_id: AliasId,
    pub token_id: TokenId,
    #[serde(with = "crate::models::u128_string")]
    pub circulating_supply: u128,
    #[serde(default)]
    pub minted_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub uid: String,
    pub space: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(with = "crate::models::u128_string")]
    pub total_supply: u128,
    pub status: TokenStatus,
    #[serde(default)]
    pub minting: Option<TokenMinting>,
    #[serde(default)]
    pub imported: bool,
}
document!(Token, DocKind::Tokens);

// Stamps

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub uid: String,
    #[serde(default)]
    pub space: Option<String>,
    pub checksum: String,
    pub bytes: u64,
    #[serde(default)]
    pub funded: bool,
    #[serde(default)]
    pub days: u64,
    #[serde(default)]
    pub expires_at: Option<u64>,
    #[serde(default)]
    pub alias_id: Option<AliasId>,
    #[serde(default)]
    pub order: Option<String>,
}
document!(Stamp, DocKind::Stamps);

// Reconciliation guard records

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// `order_uid:message_id`
    pub uid: String,
    pub order: String,
    pub message_id: MessageId,
    pub reconciled_on: u64,
}
document!(Reconciliation, DocKind::Reconciliations);
