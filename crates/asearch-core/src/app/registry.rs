//! AsyncSearchRegistry - 実行中・完了済みの非同期検索の表
//!
//! # 設計
//! - グローバル変数ではなく、明示的に構築して参照で渡す（`Clone` は `Arc` の複製）
//! - エントリごとの Mutex で状態を直列化する（エントリ間は独立）
//! - 状態を変えたら、ロックを保持したまま watch チャネルへ snapshot を publish する
//!   → publish 順 == 変更順。waiter は snapshot だけを読む
//! - ロック順序: map のロックとエントリのロックを同時に保持しない

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info};

use super::retention::{RetentionTimer, deadline_after, delay_until};
use super::status::RegistryCounts;
use crate::domain::{
    AsyncSearchHandle, RegistryError, SearchFailure, SearchSnapshot, SearchStatus,
};
use crate::ports::Clock;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mutable part of an entry. Only the registry touches it.
struct EntryState {
    snapshot: SearchSnapshot,
    generation: u64,
    timer: Option<RetentionTimer>,
}

/// One registered async search.
///
/// Callers get an `Arc<SearchEntry>` from [`AsyncSearchRegistry::get`] and may
/// only read or subscribe; every mutation goes through the registry.
pub struct SearchEntry {
    handle: AsyncSearchHandle,
    state: Mutex<EntryState>,
    published: watch::Sender<SearchSnapshot>,
}

impl SearchEntry {
    pub fn handle(&self) -> &AsyncSearchHandle {
        &self.handle
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SearchSnapshot {
        self.published.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.published.subscribe()
    }

    /// Lock, mutate, publish. Publication happens before the lock is released.
    fn update<R>(&self, f: impl FnOnce(&mut EntryState) -> R) -> R {
        let mut state = lock(&self.state);
        let out = f(&mut state);
        self.published.send_replace(state.snapshot.clone());
        out
    }
}

impl std::fmt::Debug for SearchEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEntry")
            .field("handle", &self.handle)
            .field("status", &self.published.borrow().status)
            .finish()
    }
}

pub(crate) struct RegistryInner {
    entries: Mutex<HashMap<AsyncSearchHandle, Arc<SearchEntry>>>,
    clock: Arc<dyn Clock>,
}

impl RegistryInner {
    fn lookup(&self, handle: &AsyncSearchHandle) -> Result<Arc<SearchEntry>, RegistryError> {
        lock(&self.entries)
            .get(handle)
            .cloned()
            .ok_or_else(|| RegistryError::TaskNotFound(handle.clone()))
    }

    fn detach(&self, entry: &Arc<SearchEntry>) {
        let mut entries = lock(&self.entries);
        if let Some(current) = entries.get(entry.handle())
            && Arc::ptr_eq(current, entry)
        {
            entries.remove(entry.handle());
        }
    }

    /// Called by the retention timer of `generation`.
    pub(crate) fn expire_if_current(&self, handle: &AsyncSearchHandle, generation: u64) {
        let Ok(entry) = self.lookup(handle) else {
            return;
        };
        let expired = entry.update(|state| {
            if state.generation != generation || state.snapshot.status == SearchStatus::Expired {
                return false;
            }
            state.snapshot.status = SearchStatus::Expired;
            // 自分自身のタイマー。この後に await はないので abort されても問題ない
            state.timer.take();
            true
        });
        if expired {
            self.detach(&entry);
            info!(id = %handle, "async search expired");
        }
    }
}

/// Process-wide table of async searches, keyed by handle.
///
/// Entries are created on submit, mutated through the completion callbacks
/// (`complete`, `fail`, `cancel`) and `extend`, and destroyed on expiry,
/// `remove` or `shutdown`. Methods that arm timers must run inside a tokio
/// runtime.
#[derive(Clone)]
pub struct AsyncSearchRegistry {
    inner: Arc<RegistryInner>,
}

impl AsyncSearchRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: Mutex::new(HashMap::new()),
                clock,
            }),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// Register a RUNNING search retained for `ttl`.
    pub fn register(
        &self,
        handle: AsyncSearchHandle,
        ttl: Duration,
    ) -> Result<Arc<SearchEntry>, RegistryError> {
        let now = self.inner.clock.now();
        let expires_at = deadline_after(now, ttl);
        let snapshot = SearchSnapshot::running(handle.clone(), now, expires_at);

        let (published, _) = watch::channel(snapshot.clone());
        let entry = Arc::new(SearchEntry {
            handle: handle.clone(),
            state: Mutex::new(EntryState {
                snapshot,
                generation: 0,
                timer: None,
            }),
            published,
        });

        {
            let mut entries = lock(&self.inner.entries);
            if entries.contains_key(&handle) {
                return Err(RegistryError::DuplicateHandle(handle));
            }
            entries.insert(handle.clone(), Arc::clone(&entry));
        }

        entry.update(|state| {
            // insert 直後に extend 済みなら、そちらのタイマーが最新
            if state.timer.is_none() && state.generation == 0 {
                state.timer = Some(self.arm(&handle, state.generation, now, expires_at));
            }
        });
        info!(id = %handle, %expires_at, "registered async search");
        Ok(entry)
    }

    /// Fails with `TaskNotFound` when the handle is unknown or already reaped.
    pub fn get(&self, handle: &AsyncSearchHandle) -> Result<Arc<SearchEntry>, RegistryError> {
        self.inner.lookup(handle)
    }

    /// Raise `expires_at` to `new_expiry` if that is later. Never shortens.
    pub fn extend(
        &self,
        handle: &AsyncSearchHandle,
        new_expiry: DateTime<Utc>,
    ) -> Result<SearchSnapshot, RegistryError> {
        let entry = self.inner.lookup(handle)?;
        let now = self.inner.clock.now();
        entry.update(|state| {
            if state.snapshot.status == SearchStatus::Expired {
                return Err(RegistryError::TaskNotFound(handle.clone()));
            }
            if new_expiry > state.snapshot.expires_at {
                state.snapshot.expires_at = new_expiry;
                state.generation += 1;
                // 古いタイマーは drop 時に abort される
                state.timer = Some(self.arm(handle, state.generation, now, new_expiry));
                debug!(id = %handle, expires_at = %new_expiry, "extended retention");
            }
            Ok(state.snapshot.clone())
        })
    }

    /// Delete the entry and its timer. A RUNNING entry is cancelled first so
    /// that its waiters and executor are released.
    pub fn remove(&self, handle: &AsyncSearchHandle) -> Result<SearchSnapshot, RegistryError> {
        let entry = lock(&self.inner.entries)
            .remove(handle)
            .ok_or_else(|| RegistryError::TaskNotFound(handle.clone()))?;
        let snapshot = entry.update(|state| {
            if state.snapshot.status == SearchStatus::Running {
                state.snapshot.status = SearchStatus::Cancelled;
            }
            state.timer.take();
            state.snapshot.clone()
        });
        info!(id = %handle, status = ?snapshot.status, "removed async search");
        Ok(snapshot)
    }

    pub fn complete(
        &self,
        handle: &AsyncSearchHandle,
        result: serde_json::Value,
    ) -> Result<SearchSnapshot, RegistryError> {
        self.transition(handle, SearchStatus::Completed, |snapshot| {
            snapshot.result = Some(result);
        })
    }

    pub fn fail(
        &self,
        handle: &AsyncSearchHandle,
        failure: SearchFailure,
    ) -> Result<SearchSnapshot, RegistryError> {
        self.transition(handle, SearchStatus::Failed, |snapshot| {
            snapshot.failure = Some(failure);
        })
    }

    /// Releases every current waiter with CANCELLED.
    pub fn cancel(&self, handle: &AsyncSearchHandle) -> Result<SearchSnapshot, RegistryError> {
        self.transition(handle, SearchStatus::Cancelled, |_| {})
    }

    fn transition(
        &self,
        handle: &AsyncSearchHandle,
        to: SearchStatus,
        apply: impl FnOnce(&mut SearchSnapshot),
    ) -> Result<SearchSnapshot, RegistryError> {
        let entry = self.inner.lookup(handle)?;
        let snapshot = entry.update(|state| match state.snapshot.status {
            SearchStatus::Running => {
                state.snapshot.status = to;
                apply(&mut state.snapshot);
                Ok(state.snapshot.clone())
            }
            SearchStatus::Expired => Err(RegistryError::TaskNotFound(handle.clone())),
            status => Err(RegistryError::AlreadyTerminal {
                handle: handle.clone(),
                status,
            }),
        })?;
        info!(id = %handle, status = ?to, "async search finished");
        Ok(snapshot)
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> RegistryCounts {
        let entries: Vec<Arc<SearchEntry>> = lock(&self.inner.entries).values().cloned().collect();
        let mut counts = RegistryCounts::default();
        for entry in entries {
            counts.record(entry.published.borrow().status);
        }
        counts
    }

    /// Cancel every running search, drop every timer and empty the table.
    /// Returns the number of entries drained.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<Arc<SearchEntry>> = lock(&self.inner.entries)
            .drain()
            .map(|(_, entry)| entry)
            .collect();
        for entry in &drained {
            entry.update(|state| {
                if state.snapshot.status == SearchStatus::Running {
                    state.snapshot.status = SearchStatus::Cancelled;
                }
                state.timer.take();
            });
        }
        info!(drained = drained.len(), "async search registry shut down");
        drained.len()
    }

    fn arm(
        &self,
        handle: &AsyncSearchHandle,
        generation: u64,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> RetentionTimer {
        RetentionTimer::arm(
            Arc::downgrade(&self.inner),
            handle.clone(),
            generation,
            delay_until(now, expires_at),
        )
    }

    #[cfg(test)]
    fn pending_timer_generation(&self, handle: &AsyncSearchHandle) -> Option<u64> {
        let entry = self.inner.lookup(handle).ok()?;
        let state = lock(&entry.state);
        state.timer.as_ref().map(RetentionTimer::generation)
    }
}

impl std::fmt::Debug for AsyncSearchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSearchRegistry")
            .field("entries", &self.len())
            .finish()
    }
}
