use corelib::{Address, NativeToken, Network, OutputKind, TokenId, TokenScheme};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest metadata feature the ledger accepts, in bytes.
pub const MAX_METADATA_LEN: usize = 8192;

/// Largest number of distinct native assets one output may hold.
pub const MAX_NATIVE_TOKENS: usize = 64;

/// Identifier carried by container and foundry outputs until the ledger
/// assigns the real one on confirmation.
pub const ZERO_ID: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";

/// Protocol parameters of the storage cost ("storage deposit") formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostParameters {
    /// Cost of one virtual byte.
    pub byte_cost: u64,
    /// Weight of data bytes.
    pub factor_data: u64,
    /// Weight of key (indexed) bytes.
    pub factor_key: u64,
}

impl CostParameters {
    pub const fn new(byte_cost: u64, factor_data: u64, factor_key: u64) -> Self {
        Self {
            byte_cost,
            factor_data,
            factor_key,
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Iota | Network::Atoi => Self::new(250, 1, 10),
            Network::Smr | Network::Rms => Self::new(100, 1, 10),
        }
    }

    /// Fixed virtual size every output is charged on top of its own bytes
    /// (output id + block id + milestone data).
    pub fn offset(&self) -> u64 {
        34 * self.factor_key + 40 * self.factor_data
    }
}

impl Default for CostParameters {
    fn default() -> Self {
        Self::for_network(Network::Smr)
    }
}

/// What a handler wants on the ledger. `amount` is a request; the builder
/// raises it to the storage floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRequest {
    pub kind: OutputKind,
    /// Address unlock condition; state controller for containers,
    /// controlling alias for foundries.
    pub owner: Address,
    pub amount: u64,
    pub native_tokens: Vec<NativeToken>,
    pub issuer: Option<Address>,
    /// Governor of a container. Defaults to the owner.
    pub governor: Option<Address>,
    /// Immutable metadata feature (plain metadata for basic outputs).
    pub metadata: Option<String>,
    /// Mutable metadata feature; state metadata for containers.
    pub mutable_metadata: Option<String>,
    pub unlock_at: Option<u64>,
    pub token_scheme: Option<TokenScheme>,
}

impl OutputRequest {
    fn bare(kind: OutputKind, owner: Address) -> Self {
        Self {
            kind,
            owner,
            amount: 0,
            native_tokens: vec![],
            issuer: None,
            governor: None,
            metadata: None,
            mutable_metadata: None,
            unlock_at: None,
            token_scheme: None,
        }
    }

    pub fn basic(owner: Address, amount: u64) -> Self {
        Self {
            amount,
            ..Self::bare(OutputKind::Basic, owner)
        }
    }

    pub fn collectible(owner: Address) -> Self {
        Self::bare(OutputKind::Collectible, owner)
    }

    pub fn container(owner: Address) -> Self {
        Self::bare(OutputKind::Container, owner)
    }

    pub fn foundry(alias: Address, scheme: TokenScheme) -> Self {
        Self {
            token_scheme: Some(scheme),
            ..Self::bare(OutputKind::Foundry, alias)
        }
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_native_tokens(mut self, tokens: Vec<NativeToken>) -> Self {
        self.native_tokens = tokens;
        self
    }

    pub fn with_issuer(mut self, issuer: Address) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn with_governor(mut self, governor: Address) -> Self {
        self.governor = Some(governor);
        self
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    pub fn with_mutable_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.mutable_metadata = Some(metadata.into());
        self
    }

    pub fn with_unlock_at(mut self, unlock_at: u64) -> Self {
        self.unlock_at = Some(unlock_at);
        self
    }
}

/// A ledger-ready output. `amount >= storage_deposit` always holds for
/// descriptors produced by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDescriptor {
    pub kind: OutputKind,
    pub owner: Address,
    #[serde(default)]
    pub issuer: Option<Address>,
    #[serde(default)]
    pub governor: Option<Address>,
    pub amount: u64,
    #[serde(default)]
    pub native_tokens: Vec<NativeToken>,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub mutable_metadata: Option<String>,
    /// Present only when the lock was in the future at build time.
    #[serde(default)]
    pub unlock_at: Option<u64>,
    /// Zero placeholder for containers and foundries.
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub token_scheme: Option<TokenScheme>,
    /// Minimum amount the output had to carry.
    pub storage_deposit: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutputError {
    #[error("metadata is {len} bytes, limit is {max}")]
    MetadataTooLarge { len: usize, max: usize },

    #[error("{count} native assets on one output, limit is {max}")]
    TooManyNativeTokens { count: usize, max: usize },

    #[error("{0:?} outputs cannot carry a time lock")]
    TimelockNotAllowed(OutputKind),

    #[error("basic outputs cannot carry an issuer")]
    IssuerNotAllowed,

    #[error("foundry must be owned by an alias address, got {0}")]
    FoundryOwnerNotAlias(Address),

    #[error("foundry requires a token scheme")]
    MissingTokenScheme,

    #[error("inputs hold {available}, spend requires {required}")]
    InsufficientInputs { available: u64, required: u64 },

    #[error("inputs hold {available} of {token_id}, spend requires {required}")]
    InsufficientNative {
        token_id: TokenId,
        available: u128,
        required: u128,
    },

    #[error("remainder of {amount} cannot cover its storage deposit of {minimum}")]
    DustRemainder { amount: u64, minimum: u64 },

    #[error("amount overflow")]
    Overflow,
}

impl OutputError {
    /// Caller-supplied content the ledger would never accept, as opposed to
    /// a wiring or arithmetic fault.
    pub fn is_schema_violation(&self) -> bool {
        matches!(
            self,
            OutputError::MetadataTooLarge { .. } | OutputError::TooManyNativeTokens { .. }
        )
    }
}
