//! AsyncSearchService - submit / get / delete の入口
//!
//! # フロー（get）
//! 1. validate（registry に触る前に失敗させる）
//! 2. 上限チェック（keep_alive / wait_for_completion_timeout）
//! 3. lookup（無ければ TaskNotFound）
//! 4. keep_alive があれば extend（延長のみ、短縮しない）
//! 5. 完了 or タイムアウトまで待つ
//! 6. snapshot から応答を作る
//!
//! submit は handle を発行して登録し、executor を別タスクで起動してから
//! get と同じように待ちます。

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use super::builder::ServiceBuilder;
use super::config::AsyncSearchConfig;
use super::registry::{AsyncSearchRegistry, SearchEntry};
use super::retention::deadline_after;
use super::status::RegistryCounts;
use super::waiter::{settled, wait_for_completion};
use crate::domain::{
    AsyncSearchError, AsyncSearchHandle, AsyncSearchResponse, DeleteAsyncSearchRequest,
    GetAsyncSearchRequest, RegistryError, SearchFailure, SearchSnapshot, SearchStatus,
    SubmitAsyncSearchRequest, TimeValue,
};
use crate::ports::{Clock, IdGenerator, SearchExecutor};

/// Front door of the async search subsystem.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct AsyncSearchService {
    registry: AsyncSearchRegistry,
    executor: Arc<dyn SearchExecutor>,
    id_generator: Arc<dyn IdGenerator>,
    config: AsyncSearchConfig,
}

impl AsyncSearchService {
    pub fn builder(executor: Arc<dyn SearchExecutor>) -> ServiceBuilder {
        ServiceBuilder::new(executor)
    }

    pub(crate) fn from_parts(
        registry: AsyncSearchRegistry,
        executor: Arc<dyn SearchExecutor>,
        id_generator: Arc<dyn IdGenerator>,
        config: AsyncSearchConfig,
    ) -> Self {
        Self {
            registry,
            executor,
            id_generator,
            config,
        }
    }

    pub fn registry(&self) -> &AsyncSearchRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AsyncSearchConfig {
        &self.config
    }

    /// Start a search and wait up to its wait_for_completion_timeout.
    pub async fn submit(
        &self,
        request: SubmitAsyncSearchRequest,
    ) -> Result<AsyncSearchResponse, AsyncSearchError> {
        request.validate()?;
        let keep_alive = self
            .check_keep_alive(request.keep_alive)?
            .unwrap_or(self.config.default_keep_alive);
        let wait = self.check_wait(request.wait_for_completion_timeout)?;

        let handle = AsyncSearchHandle::new(
            self.config.node_id.clone(),
            self.id_generator.generate_search_id(),
        );
        let entry = self.registry.register(handle, to_duration(keep_alive))?;
        self.spawn_execution(&entry, request.query);

        let snapshot = wait_for_completion(&entry, wait).await;
        respond(snapshot)
    }

    /// Fetch a search by handle, optionally extending its retention first.
    pub async fn get(
        &self,
        request: GetAsyncSearchRequest,
    ) -> Result<AsyncSearchResponse, AsyncSearchError> {
        request.validate()?;
        let keep_alive = self.check_keep_alive(request.keep_alive())?;
        let wait = self.check_wait(request.wait_for_completion_timeout())?;

        let entry = self.registry.get(request.handle())?;
        if let Some(keep_alive) = keep_alive {
            let expires_at = deadline_after(self.registry.clock().now(), to_duration(keep_alive));
            self.registry.extend(request.handle(), expires_at)?;
        }

        let snapshot = wait_for_completion(&entry, wait).await;
        respond(snapshot)
    }

    /// Cancel the search if it is still running, then drop it.
    pub fn delete(&self, request: DeleteAsyncSearchRequest) -> Result<(), AsyncSearchError> {
        let removed = self.registry.remove(request.handle())?;
        info!(id = %request.handle(), status = ?removed.status, "deleted async search");
        Ok(())
    }

    pub fn counts(&self) -> RegistryCounts {
        self.registry.counts()
    }

    /// Cancel everything still running and empty the registry.
    pub fn shutdown(&self) -> usize {
        self.registry.shutdown()
    }

    fn check_keep_alive(
        &self,
        requested: Option<TimeValue>,
    ) -> Result<Option<TimeValue>, AsyncSearchError> {
        match requested {
            Some(tv) if tv.as_nanos() > self.config.max_keep_alive.as_nanos() => {
                Err(AsyncSearchError::KeepAliveTooLarge {
                    requested: tv,
                    max: self.config.max_keep_alive,
                })
            }
            other => Ok(other),
        }
    }

    fn check_wait(&self, requested: Option<TimeValue>) -> Result<Duration, AsyncSearchError> {
        let wait = requested.unwrap_or(self.config.default_wait_for_completion_timeout);
        if let Some(max) = self.config.max_wait_for_completion_timeout
            && wait.as_nanos() > max.as_nanos()
        {
            return Err(AsyncSearchError::WaitTooLarge {
                requested: wait,
                max,
            });
        }
        Ok(to_duration(wait))
    }

    /// The execution task ends when the executor returns or when the entry
    /// settles first (cancel, delete, expiry), whichever comes first.
    ///
    /// The executor runs in its own task so that a panic surfaces as a
    /// `JoinError` and is recorded as FAILED.
    fn spawn_execution(&self, entry: &SearchEntry, query: Value) {
        let registry = self.registry.clone();
        let executor = Arc::clone(&self.executor);
        let handle = entry.handle().clone();
        let mut rx = entry.subscribe();
        tokio::spawn(async move {
            let mut execution = tokio::spawn(async move { executor.execute(query).await });
            tokio::select! {
                joined = &mut execution => {
                    let recorded = match joined {
                        Ok(Ok(result)) => registry.complete(&handle, result),
                        Ok(Err(failure)) => registry.fail(&handle, failure),
                        Err(err) => {
                            let failure = execution_failure(err);
                            warn!(id = %handle, reason = %failure.reason, "search execution crashed");
                            registry.fail(&handle, failure)
                        }
                    };
                    // cancel/expire と競合した場合はここに来る
                    if let Err(err) = recorded {
                        debug!(id = %handle, error = %err, "search outcome discarded");
                    }
                }
                _ = settled(&mut rx) => {
                    execution.abort();
                    debug!(id = %handle, "search execution aborted");
                }
            }
        });
    }
}

impl std::fmt::Debug for AsyncSearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSearchService")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

/// panic のメッセージは &str か String のどちらか
fn execution_failure(err: JoinError) -> SearchFailure {
    let reason = if err.is_panic() {
        let payload = err.into_panic();
        if let Some(msg) = payload.downcast_ref::<&str>() {
            format!("search executor panicked: {msg}")
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            format!("search executor panicked: {msg}")
        } else {
            "search executor panicked".to_string()
        }
    } else {
        "search execution was cancelled".to_string()
    };
    SearchFailure::new("search_phase_execution_exception", reason)
}

/// validate() 済みなので負の値は来ない
fn to_duration(tv: TimeValue) -> Duration {
    tv.to_std().unwrap_or(Duration::ZERO)
}

/// An entry reaped while we waited on it no longer exists.
fn respond(snapshot: SearchSnapshot) -> Result<AsyncSearchResponse, AsyncSearchError> {
    if snapshot.status == SearchStatus::Expired {
        return Err(RegistryError::TaskNotFound(snapshot.handle).into());
    }
    Ok(snapshot.into())
}
