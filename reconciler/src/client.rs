//! Narrow interfaces to the ledger node and the platform wallet.
//!
//! Neither trait submits anything: the engine only reads ledger state and
//! sizes outputs. Submission and signing belong to the wallet layer that
//! consumes the follow-up step records.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use corelib::{Address, AliasId, LedgerOutput, Network, NftId, OutputId, TokenId};
use parking_lot::RwLock;
use thiserror::Error;

use crate::output::CostParameters;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0} not found on ledger")]
    NotFound(String),

    #[error("ledger node unavailable: {0:#}")]
    Unavailable(#[source] anyhow::Error),
}

impl LedgerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_))
    }
}

#[async_trait]
pub trait LedgerClient: Send + Sync + 'static {
    async fn get_output(&self, id: &OutputId) -> Result<LedgerOutput, LedgerError>;

    /// Unspent outputs currently owned by `address`.
    async fn outputs_by_address(&self, address: &Address) -> Result<Vec<LedgerOutput>, LedgerError>;

    /// Latest collectible output carrying `id`.
    async fn nft_output(&self, id: &NftId) -> Result<LedgerOutput, LedgerError>;

    /// Latest container output carrying `id`.
    async fn alias_output(&self, id: &AliasId) -> Result<LedgerOutput, LedgerError>;

    /// Foundry that minted native asset `id`.
    async fn foundry_output(&self, id: &TokenId) -> Result<LedgerOutput, LedgerError>;

    async fn cost_parameters(&self) -> Result<CostParameters, LedgerError>;
}

#[async_trait]
pub trait Wallet: Send + Sync + 'static {
    /// Fresh platform-controlled address on `network`.
    async fn new_address(&self, network: Network) -> Result<Address, LedgerError>;

    async fn cost_parameters(&self, network: Network) -> Result<CostParameters, LedgerError>;
}

/// In-memory ledger view and wallet for development and tests.
pub struct MemoryLedger {
    params: CostParameters,
    outputs: RwLock<HashMap<OutputId, LedgerOutput>>,
    next_address: AtomicU64,
}

impl MemoryLedger {
    pub fn new(params: CostParameters) -> Self {
        Self {
            params,
            outputs: RwLock::new(HashMap::new()),
            next_address: AtomicU64::new(0),
        }
    }

    pub fn insert(&self, output: LedgerOutput) {
        self.outputs.write().insert(output.output_id.clone(), output);
    }

    fn find_by<F>(&self, what: String, pred: F) -> Result<LedgerOutput, LedgerError>
    where
        F: Fn(&LedgerOutput) -> bool,
    {
        self.outputs
            .read()
            .values()
            .find(|o| pred(o))
            .cloned()
            .ok_or(LedgerError::NotFound(what))
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(CostParameters::default())
    }
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn get_output(&self, id: &OutputId) -> Result<LedgerOutput, LedgerError> {
        self.outputs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("output {id}")))
    }

    async fn outputs_by_address(&self, address: &Address) -> Result<Vec<LedgerOutput>, LedgerError> {
        Ok(self
            .outputs
            .read()
            .values()
            .filter(|o| &o.owner == address)
            .cloned()
            .collect())
    }

    async fn nft_output(&self, id: &NftId) -> Result<LedgerOutput, LedgerError> {
        self.find_by(format!("nft {id}"), |o| o.nft_id.as_ref() == Some(id))
    }

    async fn alias_output(&self, id: &AliasId) -> Result<LedgerOutput, LedgerError> {
        self.find_by(format!("alias {id}"), |o| o.alias_id.as_ref() == Some(id))
    }

    async fn foundry_output(&self, id: &TokenId) -> Result<LedgerOutput, LedgerError> {
        self.find_by(format!("foundry of {id}"), |o| {
            o.token_id.as_ref() == Some(id) && o.token_scheme.is_some()
        })
    }

    async fn cost_parameters(&self) -> Result<CostParameters, LedgerError> {
        Ok(self.params)
    }
}

#[async_trait]
impl Wallet for MemoryLedger {
    async fn new_address(&self, network: Network) -> Result<Address, LedgerError> {
        let n = self.next_address.fetch_add(1, Ordering::SeqCst);
        Ok(Address::ed25519(format!("{network}:0x{n:064x}")))
    }

    async fn cost_parameters(&self, _network: Network) -> Result<CostParameters, LedgerError> {
        Ok(self.params)
    }
}
