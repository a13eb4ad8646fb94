use thiserror::Error;

use crate::models::{AlarmId, TaskType};
use crate::store::StorageError;

/// Errors raised while producing or running a dismissal task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// No generator exists for this task type.
    #[error("unsupported task type: {0}")]
    UnsupportedTaskType(TaskType),

    /// The session already produced its result.
    #[error("dismissal session already completed")]
    SessionCompleted,
}

/// Errors raised by alarm construction and the alarm store.
///
/// `NotFound` and `DuplicateId` leave the state untouched. `Storage` means the
/// change was applied in memory but could not be written out.
#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("alarm not found: {0}")]
    NotFound(AlarmId),

    #[error("alarm id already in use: {0}")]
    DuplicateId(AlarmId),

    #[error("invalid alarm: {0}")]
    Invalid(String),

    #[error("alarm change not persisted: {0}")]
    Storage(#[from] StorageError),
}
