//! Utilities errors definition.

use thiserror::Error;

pub type WorkQueueResult<T> = Result<T, WorkQueueError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkQueueError {
    #[error("tasks cannot be pushed while the queue is running")]
    PushWhileRunning,

    #[error("a work queue needs at least one thread")]
    NoThreads,
}
