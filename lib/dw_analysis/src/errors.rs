//! Analysis errors definition.

use dw_domains::errors::DomainError;
use dw_utils::errors::WorkQueueError;
use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("internal error: {0}")]
    Internal(String),

    #[error("undefined operation: {0}")]
    UndefinedOperation(String),

    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("work queue error: {0}")]
    WorkQueue(#[from] WorkQueueError),
}

/// Failure of the parallel fixpoint iterator: either the transformer failed,
/// or the work queue could not run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParallelFixpointError<E> {
    #[error("transformer error: {0}")]
    Transformer(E),

    #[error("work queue error: {0}")]
    WorkQueue(#[from] WorkQueueError),
}
