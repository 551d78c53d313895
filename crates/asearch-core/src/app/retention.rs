//! RetentionTimer - 保持期限（expires_at）での期限切れ処理
//!
//! エントリごとに pending なタイマーは常に 1 つだけです。
//! extend は古いタイマーを abort してから新しい世代で張り直します。
//! 発火時に世代が一致しなければ（間に extend があった）何もしません。

use std::sync::Weak;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;

use super::registry::RegistryInner;
use crate::domain::AsyncSearchHandle;

/// The single pending expiry timer of one registry entry.
///
/// Dropping the timer aborts it.
#[derive(Debug)]
pub(crate) struct RetentionTimer {
    generation: u64,
    task: JoinHandle<()>,
}

impl RetentionTimer {
    /// Must be called from within a tokio runtime.
    pub(crate) fn arm(
        registry: Weak<RegistryInner>,
        handle: AsyncSearchHandle,
        generation: u64,
        delay: Duration,
    ) -> Self {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // registry が先に drop されていれば何もしない
            if let Some(registry) = registry.upgrade() {
                registry.expire_if_current(&handle, generation);
            }
        });
        Self { generation, task }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for RetentionTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Time left until `deadline`, zero if it already passed.
pub(crate) fn delay_until(now: DateTime<Utc>, deadline: DateTime<Utc>) -> Duration {
    (deadline - now).to_std().unwrap_or(Duration::ZERO)
}

/// `now + after`, saturating at the largest representable instant.
pub fn deadline_after(now: DateTime<Utc>, after: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(after)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
