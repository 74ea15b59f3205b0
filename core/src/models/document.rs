use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Document collections of the order ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocKind {
    Orders,
    Awards,
    Collections,
    Nfts,
    Spaces,
    Tokens,
    Stamps,
    Reconciliations,
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Orders => "orders",
            DocKind::Awards => "awards",
            DocKind::Collections => "collections",
            DocKind::Nfts => "nfts",
            DocKind::Spaces => "spaces",
            DocKind::Tokens => "tokens",
            DocKind::Stamps => "stamps",
            DocKind::Reconciliations => "reconciliations",
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed record stored as a JSON document under `KIND/uid`.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const KIND: DocKind;

    fn uid(&self) -> &str;
}
