//! Errors - エラー型と分類
//!
//! 呼び出し側に返るエラーは `AsyncSearchError` に集約し、
//! `ErrorKind` で HTTP 相当のステータスに分類します。
//! タスク自体の失敗（FAILED）はエラーではなくレスポンス本体で返します。

use thiserror::Error;

use super::handle::{AsyncSearchHandle, HandleError};
use super::request::{DecodeError, ValidationErrors};
use super::state::SearchStatus;
use super::time_value::{TimeValue, TimeValueError};

/// ErrorKind はエラーの運用分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client sent something unusable (4xx).
    BadRequest,
    /// Valid id, but unknown or already reaped (404).
    NotFound,
    /// State conflict, e.g. completing a task twice (409).
    Conflict,
    /// Internal invariant violation; never the client's fault (500).
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}

/// Registry operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("async search [{0}] not found")]
    TaskNotFound(AsyncSearchHandle),

    #[error("async search [{0}] is already registered")]
    DuplicateHandle(AsyncSearchHandle),

    #[error("async search [{handle}] is already {status:?}")]
    AlreadyTerminal {
        handle: AsyncSearchHandle,
        status: SearchStatus,
    },
}

#[derive(Debug, Error)]
pub enum AsyncSearchError {
    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid value for parameter [{name}]: {source}")]
    InvalidParameter {
        name: &'static str,
        #[source]
        source: TimeValueError,
    },

    #[error("keep_alive [{requested}] exceeds the maximum allowed [{max}]")]
    KeepAliveTooLarge { requested: TimeValue, max: TimeValue },

    #[error("wait_for_completion_timeout [{requested}] exceeds the maximum allowed [{max}]")]
    WaitTooLarge { requested: TimeValue, max: TimeValue },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl AsyncSearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AsyncSearchError::Handle(_)
            | AsyncSearchError::Validation(_)
            | AsyncSearchError::Decode(_)
            | AsyncSearchError::InvalidParameter { .. }
            | AsyncSearchError::KeepAliveTooLarge { .. }
            | AsyncSearchError::WaitTooLarge { .. } => ErrorKind::BadRequest,
            AsyncSearchError::Registry(RegistryError::TaskNotFound(_)) => ErrorKind::NotFound,
            AsyncSearchError::Registry(RegistryError::AlreadyTerminal { .. }) => {
                ErrorKind::Conflict
            }
            AsyncSearchError::Registry(RegistryError::DuplicateHandle(_)) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}
