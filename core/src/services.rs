use std::sync::Arc;

use crate::backend::{Decomposer, TaskExecutor};
use crate::config::AppConfig;
use crate::context::ContextStore;
use crate::error::CliError;
use crate::failure::BackoffStrategyPlugin;
use crate::interactive::OperatorPrompt;
use crate::render::OutputRendererPlugin;

/// Every pluggable boundary the orchestrator talks to.
#[derive(Clone)]
pub struct Services {
    pub decomposer: Arc<dyn Decomposer>,
    pub executor: Arc<dyn TaskExecutor>,
    pub store: Arc<dyn ContextStore>,
    pub prompt: Arc<dyn OperatorPrompt>,
    pub renderer: Arc<dyn OutputRendererPlugin>,
    pub backoff: Arc<dyn BackoffStrategyPlugin>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("decomposer", &self.decomposer.name())
            .field("executor", &self.executor.name())
            .field("store", &self.store.name())
            .field("prompt", &self.prompt.name())
            .field("renderer", &self.renderer.name())
            .field("backoff", &self.backoff.name())
            .finish()
    }
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, CliError>;
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    services_factory: Option<Arc<dyn ServicesFactory>>,
}

impl AppContext {
    pub fn new(cfg: AppConfig, services_factory: Option<Arc<dyn ServicesFactory>>) -> Self {
        Self {
            cfg,
            services_factory,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn with_config(&self, cfg: AppConfig) -> Self {
        Self {
            cfg,
            services_factory: self.services_factory.clone(),
        }
    }

    pub async fn build_services(&self) -> Result<Services, CliError> {
        let Some(factory) = self.services_factory.as_ref() else {
            return Err(CliError::Config(
                "services_factory missing (cannot build plugins/services)".into(),
            ));
        };
        factory.build_services(&self.cfg).await
    }
}
