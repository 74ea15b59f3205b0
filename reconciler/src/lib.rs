pub mod bootstrap;
pub mod client;
pub mod commit;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod guard;
pub mod ledger;
pub mod metrics;
pub mod output;
pub mod processor;
pub mod validation;
pub mod workflow;

pub mod error;
pub mod logger;
pub mod time;

#[cfg(test)]
pub(crate) mod test_support;
