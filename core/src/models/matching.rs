use serde::{Deserialize, Serialize};

use super::ledger::{Address, LedgerOutput, MessageId, NativeToken, NftId};
use super::order::Order;

/// Value that arrived at an order's target address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub address: Address,
    pub amount: u64,
    #[serde(default)]
    pub native_tokens: Vec<NativeToken>,
    /// Set when the transfer carried a collectible output.
    #[serde(default)]
    pub nft_id: Option<NftId>,
}

impl Transfer {
    pub fn native_amount(&self, token: &NativeToken) -> u128 {
        self.native_tokens
            .iter()
            .filter(|t| t.id == token.id)
            .map(|t| t.amount)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingTransaction {
    /// Sender; credits are routed back here.
    pub from: Address,
    pub to: Transfer,
}

/// Evidence that a confirmed ledger transaction paid an open order.
///
/// Emitted by the matcher and never mutated afterwards. `order` is the
/// matcher's snapshot; the engine re-reads the order before deciding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub order: Order,
    pub incoming: IncomingTransaction,
    #[serde(default)]
    pub consumed_inputs: Vec<LedgerOutput>,
    pub message_id: MessageId,
    /// Ledger confirmation time (ms since epoch).
    pub timestamp: u64,
}

impl Match {
    pub fn order_uid(&self) -> &str {
        &self.order.uid
    }

    /// Idempotency key of this delivery.
    pub fn guard_key(&self) -> String {
        format!("{}:{}", self.order.uid, self.message_id)
    }
}
