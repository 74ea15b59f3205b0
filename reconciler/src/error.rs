use corelib::OrderInvariantError;
use thiserror::Error;

use crate::commit::CommitError;
use crate::workflow::WorkflowError;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("order {0} not found")]
    OrderNotFound(String),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error(transparent)]
    Invariant(#[from] OrderInvariantError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("commit failed: {0}")]
    Commit(#[from] CommitError),

    #[error("store unavailable: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error("encoding record failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ReconcileError {
    /// Worth another attempt: nothing was applied and a later run may see a
    /// healthy backend or a settled store.
    pub fn is_transient(&self) -> bool {
        match self {
            ReconcileError::Workflow(e) => e.is_transient(),
            ReconcileError::Commit(e) => e.is_transient(),
            ReconcileError::Store(_) => true,
            ReconcileError::OrderNotFound(_)
            | ReconcileError::Precondition(_)
            | ReconcileError::Invariant(_)
            | ReconcileError::Encode(_) => false,
        }
    }
}
