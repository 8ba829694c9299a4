//! Shared web state

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::NewsletterConfig;
use crate::engine::NewsletterPipeline;
use crate::error::Result;
use crate::web::templates::Pages;

/// Builds the pipeline for one request
pub type PipelineFactory =
    Arc<dyn Fn(Arc<NewsletterConfig>) -> Result<NewsletterPipeline> + Send + Sync>;

/// Shared state for all handlers
pub struct AppState {
    /// Read-only configuration and credentials
    pub config: Arc<NewsletterConfig>,

    pub pages: Pages,

    factory: PipelineFactory,

    // Held for the whole run: one research at a time
    run_lock: Mutex<()>,
}

impl AppState {
    /// State building production pipelines
    pub fn new(config: Arc<NewsletterConfig>) -> anyhow::Result<Arc<Self>> {
        Self::with_factory(config, Arc::new(NewsletterPipeline::from_config))
    }

    pub fn with_factory(
        config: Arc<NewsletterConfig>,
        factory: PipelineFactory,
    ) -> anyhow::Result<Arc<Self>> {
        Ok(Arc::new(Self {
            config,
            pages: Pages::new()?,
            factory,
            run_lock: Mutex::new(()),
        }))
    }

    /// A fresh pipeline for one run
    pub fn pipeline(&self) -> Result<NewsletterPipeline> {
        (self.factory)(self.config.clone())
    }

    pub fn run_lock(&self) -> &Mutex<()> {
        &self.run_lock
    }
}
