//! ServicesFactory implementation: builds every plugin the orchestrator needs from config.
use async_trait::async_trait;
use plancraft_core::api::{AppConfig, CliError, Services, ServicesFactory};

use crate::factory;

pub struct PluginServicesFactory;

impl Default for PluginServicesFactory {
    fn default() -> Self {
        Self
    }
}

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, CliError> {
        let store = factory::build_store(cfg).await?;
        let decomposer =
            factory::build_decomposer(cfg).map_err(|e| CliError::Config(format!("{e:#}")))?;
        Ok(Services {
            decomposer,
            executor: factory::build_executor(cfg),
            store,
            prompt: factory::build_prompt(cfg),
            renderer: factory::build_renderer(&cfg.output),
            backoff: factory::build_backoff(&cfg.retry),
        })
    }
}
