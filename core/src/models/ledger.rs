use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(v: impl Into<String>) -> Self {
                Self(v.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a container (alias) output, assigned by the ledger on confirmation.
    AliasId
);
string_id!(
    /// Identifier of a collectible (NFT) output, assigned by the ledger on confirmation.
    NftId
);
string_id!(
    /// Native asset identifier (derived from the foundry that minted it).
    TokenId
);
string_id!(OutputId);
string_id!(
    /// Ledger block/message that carried a transaction. Part of the idempotency key.
    MessageId
);

/// Ledger network an order settles on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Iota,
    Smr,
    Rms,
    Atoi,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Iota => "iota",
            Network::Smr => "smr",
            Network::Rms => "rms",
            Network::Atoi => "atoi",
        }
    }

    pub fn is_test(&self) -> bool {
        matches!(self, Network::Rms | Network::Atoi)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger address. Every variant packs to 33 bytes (type byte + 32 byte hash/id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Address {
    Ed25519(String),
    Alias(AliasId),
    Nft(NftId),
}

impl Address {
    pub const PACKED_LEN: usize = 33;

    pub fn ed25519(v: impl Into<String>) -> Self {
        Address::Ed25519(v.into())
    }

    pub fn as_alias(&self) -> Option<&AliasId> {
        match self {
            Address::Alias(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_nft(&self) -> Option<&NftId> {
        match self {
            Address::Nft(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Ed25519(v) => write!(f, "ed25519:{v}"),
            Address::Alias(id) => write!(f, "alias:{id}"),
            Address::Nft(id) => write!(f, "nft:{id}"),
        }
    }
}

/// A quantity of one native asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeToken {
    pub id: TokenId,
    #[serde(with = "crate::models::u128_string")]
    pub amount: u128,
}

impl NativeToken {
    pub fn new(id: TokenId, amount: u128) -> Self {
        Self { id, amount }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputKind {
    Basic,
    Collectible,
    Container,
    Foundry,
}

/// Simple token scheme of a foundry output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenScheme {
    #[serde(with = "crate::models::u128_string")]
    pub minted: u128,
    #[serde(with = "crate::models::u128_string")]
    pub melted: u128,
    #[serde(with = "crate::models::u128_string")]
    pub maximum: u128,
}

impl TokenScheme {
    pub fn circulating(&self) -> u128 {
        self.minted.saturating_sub(self.melted)
    }
}

/// An output as it exists on the ledger (consumed input or fetched by id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOutput {
    pub output_id: OutputId,
    pub kind: OutputKind,
    pub amount: u64,
    #[serde(default)]
    pub native_tokens: Vec<NativeToken>,
    /// Address unlock condition; state controller for containers,
    /// immutable alias address for foundries.
    pub owner: Address,
    /// Governor unlock condition (containers only).
    #[serde(default)]
    pub governor: Option<Address>,
    #[serde(default)]
    pub issuer: Option<Address>,
    #[serde(default)]
    pub alias_id: Option<AliasId>,
    #[serde(default)]
    pub nft_id: Option<NftId>,
    #[serde(default)]
    pub token_id: Option<TokenId>,
    #[serde(default)]
    pub token_scheme: Option<TokenScheme>,
    /// Immutable metadata feature, UTF-8 JSON for the standards used here.
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub mutable_metadata: Option<String>,
}
