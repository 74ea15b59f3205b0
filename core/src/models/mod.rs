pub mod document;
pub mod ledger;
pub mod matching;
pub mod order;
pub mod records;

pub use document::{DocKind, Document};
pub use ledger::{
    Address, AliasId, LedgerOutput, MessageId, NativeToken, Network, NftId, OutputId, OutputKind,
    TokenId, TokenScheme,
};
pub use matching::{IncomingTransaction, Match, Transfer};
pub use order::*;
pub use records::*;

/// Serializes 128-bit quantities as decimal strings so they survive JSON
/// documents without precision loss.
pub mod u128_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(v: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse::<u128>().map_err(D::Error::custom)
    }
}
