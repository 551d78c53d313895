//! SearchSnapshot - registry エントリの読み取り専用コピー
//!
//! Registry は状態を変更するたびに snapshot を watch チャネルへ publish します。
//! Waiter とレスポンス構築はこの snapshot だけを読みます。

use chrono::{DateTime, Utc};

use super::handle::AsyncSearchHandle;
use super::state::{SearchFailure, SearchStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot {
    pub handle: AsyncSearchHandle,
    pub status: SearchStatus,
    /// Present only when `status == Completed`.
    pub result: Option<serde_json::Value>,
    /// Present only when `status == Failed`.
    pub failure: Option<SearchFailure>,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SearchSnapshot {
    pub fn running(
        handle: AsyncSearchHandle,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            handle,
            status: SearchStatus::Running,
            result: None,
            failure: None,
            started_at,
            expires_at,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SearchStatus::Running
    }
}
