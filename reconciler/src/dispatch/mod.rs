//! Match delivery: per-order workers plus retry of transient failures.

pub mod retry;
pub mod router;

pub use retry::RetryPolicy;
pub use router::MatchRouter;
