//! Waiter - 完了待ち（wait_for_completion）
//!
//! 何人の呼び出し元が同じタスクを待っても、検索そのものは 1 回しか走りません。
//! 待機は watch チャネルの購読で、registry のロックは一切保持しません。
//! タイムアウトはエラーではなく、その時点の snapshot を返します。

use std::time::Duration;

use tokio::sync::watch;

use super::registry::SearchEntry;
use crate::domain::SearchSnapshot;

/// Wait until the entry leaves RUNNING or `timeout` elapses, then snapshot.
///
/// A zero timeout returns the current snapshot without suspending. The
/// timeout only ends this caller's wait; the search keeps running.
pub async fn wait_for_completion(entry: &SearchEntry, timeout: Duration) -> SearchSnapshot {
    let mut rx = entry.subscribe();
    if timeout.is_zero() {
        return rx.borrow().clone();
    }
    let settled = match tokio::time::timeout(timeout, rx.wait_for(|s| s.status.is_settled())).await
    {
        Ok(Ok(snapshot)) => Some(snapshot.clone()),
        // Err(_) はタイムアウト。Ok(Err(_)) は sender が drop された場合で、entry を
        // 借用している間は起きない
        _ => None,
    };
    settled.unwrap_or_else(|| rx.borrow().clone())
}

/// Resolves once the snapshot leaves RUNNING or the entry is dropped.
pub(crate) async fn settled(rx: &mut watch::Receiver<SearchSnapshot>) {
    let _ = rx.wait_for(|s| s.status.is_settled()).await;
}
