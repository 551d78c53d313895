//! DelayedExecutor - 開発用の SearchExecutor
//!
//! 指定時間 sleep してから、固定の結果（または失敗）を返します。
//! 結果の既定値は受け取ったクエリそのもの（echo）です。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::domain::SearchFailure;
use crate::ports::SearchExecutor;

/// What a [`DelayedExecutor`] produces once its delay has elapsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Return the query itself as the result.
    Echo,
    Respond(Value),
    Fail(SearchFailure),
}

#[derive(Debug, Clone)]
pub struct DelayedExecutor {
    delay: Duration,
    outcome: Outcome,
}

impl DelayedExecutor {
    pub fn new(delay: Duration, outcome: Outcome) -> Self {
        Self { delay, outcome }
    }

    /// Echoes the query after `delay`.
    pub fn echo(delay: Duration) -> Self {
        Self::new(delay, Outcome::Echo)
    }

    /// Echoes the query without sleeping.
    pub fn immediate() -> Self {
        Self::echo(Duration::ZERO)
    }

    pub fn failing(delay: Duration, failure: SearchFailure) -> Self {
        Self::new(delay, Outcome::Fail(failure))
    }
}

#[async_trait]
impl SearchExecutor for DelayedExecutor {
    async fn execute(&self, query: Value) -> Result<Value, SearchFailure> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        debug!(delay_ms = self.delay.as_millis() as u64, "delayed executor finished");
        match &self.outcome {
            Outcome::Echo => Ok(query),
            Outcome::Respond(value) => Ok(value.clone()),
            Outcome::Fail(failure) => Err(failure.clone()),
        }
    }
}
