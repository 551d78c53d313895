//! SearchExecutor port - 検索エンジンとの境界
//!
//! 検索の実行そのものはこのクレートの範囲外です。
//! Service は submit 時に executor を別タスクで起動し、
//! 結果を registry の complete / fail コールバックに流します。

use async_trait::async_trait;

use crate::domain::SearchFailure;

/// Runs one search to completion.
///
/// The future is dropped when the search is cancelled, so implementations
/// should not rely on running past an `.await` point after cancellation.
#[async_trait]
pub trait SearchExecutor: Send + Sync + 'static {
    async fn execute(&self, query: serde_json::Value) -> Result<serde_json::Value, SearchFailure>;
}
