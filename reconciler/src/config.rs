use std::str::FromStr;

use anyhow::Context;
use corelib::{Address, AliasId, NftId};

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: String,

    // =========================
    // Dispatch configuration
    // =========================
    /// Capacity of the channel feeding the router.
    pub intake_capacity: usize,

    /// Matches accepted by the router but not yet processed, across all
    /// orders.
    ///
    /// Acts as backpressure: the router only stops accepting once the whole
    /// budget is queued, so one order's backlog does not hold up the others.
    pub max_in_flight: usize,

    /// Idle time (ms) after which a per-order worker drains its queue and exits.
    ///
    /// Orders are usually touched by a handful of matches, so workers are
    /// short-lived; the router respawns one on the next match.
    pub worker_idle_ms: u64,

    // =========================
    // Retry configuration
    // =========================
    /// Attempts per match for transient failures (store, ledger client,
    /// commit conflicts), including the first one.
    pub retry_max_attempts: u32,

    /// First backoff step (ms). Doubles per attempt, plus jitter.
    pub retry_base_ms: u64,

    /// Backoff ceiling (ms).
    pub retry_max_ms: u64,

    // =========================
    // Stamp pricing
    // =========================
    /// Storage fee per MiB per day, in base units.
    pub stamp_daily_cost_per_mb: u64,

    /// Longest period a single stamp payment can buy.
    pub stamp_max_days: u64,

    /// Receives the consumed part of stamp payments.
    pub royalty_address: Address,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Missing keys fall back
    /// to defaults; present but malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://reconciler_dev.db".to_string());

        let royalty_address = match lookup("ROYALTY_ADDRESS") {
            Some(raw) => parse_address(&raw),
            None => Address::ed25519("royalty"),
        };

        Ok(Self {
            database_url,

            intake_capacity: parse_or(&lookup, "RECON_INTAKE_CAPACITY", 64)?,
            max_in_flight: parse_or(&lookup, "RECON_MAX_IN_FLIGHT", 1_024)?,
            worker_idle_ms: parse_or(&lookup, "RECON_WORKER_IDLE_MS", 30_000)?,

            retry_max_attempts: parse_or(&lookup, "RECON_RETRY_MAX_ATTEMPTS", 5)?,
            retry_base_ms: parse_or(&lookup, "RECON_RETRY_BASE_MS", 100)?,
            retry_max_ms: parse_or(&lookup, "RECON_RETRY_MAX_MS", 5_000)?,

            stamp_daily_cost_per_mb: parse_or(&lookup, "STAMP_DAILY_COST_PER_MB", 104_000)?,
            stamp_max_days: parse_or(&lookup, "STAMP_MAX_DAYS", 36_500)?,
            royalty_address,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

/// `alias:<id>`, `nft:<id>`, `ed25519:<hash>` or a bare ed25519 hash.
fn parse_address(raw: &str) -> Address {
    let raw = raw.trim();
    if let Some(id) = raw.strip_prefix("alias:") {
        return Address::Alias(AliasId::new(id));
    }
    if let Some(id) = raw.strip_prefix("nft:") {
        return Address::Nft(NftId::new(id));
    }
    Address::ed25519(raw.strip_prefix("ed25519:").unwrap_or(raw))
}
