//! ServiceBuilder - AsyncSearchService の構築とワイヤリング
//!
//! 設定の検証は build() 時に行い、不正な設定では起動しません（Fail-fast）。

use std::sync::Arc;

use super::config::{AsyncSearchConfig, ConfigError};
use super::registry::AsyncSearchRegistry;
use super::service::AsyncSearchService;
use crate::ports::{Clock, IdGenerator, SearchExecutor, SystemClock, UlidGenerator};

/// Builds an [`AsyncSearchService`].
///
/// ```ignore
/// let service = ServiceBuilder::new(Arc::new(MyExecutor))
///     .config(AsyncSearchConfig::from_json_file("asearch.json")?)
///     .build()?;
/// ```
///
/// Unless overridden, the clock is [`SystemClock`] and ids come from a
/// [`UlidGenerator`] driven by that clock.
pub struct ServiceBuilder {
    executor: Arc<dyn SearchExecutor>,
    config: AsyncSearchConfig,
    clock: Arc<dyn Clock>,
    id_generator: Option<Arc<dyn IdGenerator>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ServiceBuilder {
    pub fn new(executor: Arc<dyn SearchExecutor>) -> Self {
        Self {
            executor,
            config: AsyncSearchConfig::default(),
            clock: Arc::new(SystemClock),
            id_generator: None,
        }
    }

    pub fn config(mut self, config: AsyncSearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(id_generator);
        self
    }

    pub fn build(self) -> Result<AsyncSearchService, BuildError> {
        self.config.validate()?;
        let id_generator: Arc<dyn IdGenerator> = match self.id_generator {
            Some(id_generator) => id_generator,
            None => Arc::new(UlidGenerator::new(Arc::clone(&self.clock))),
        };
        Ok(AsyncSearchService::from_parts(
            AsyncSearchRegistry::new(self.clock),
            self.executor,
            id_generator,
            self.config,
        ))
    }
}
