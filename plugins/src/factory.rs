use std::sync::Arc;

use anyhow::{Context, Result};

use plancraft_core::api::{
    AppConfig, BackoffStrategyPlugin, ContextStore, Decomposer, DecomposerProvider,
    ExecutorProvider, FixedBackoff, MemoryContextStore, OperatorPrompt, OutputConfig,
    OutputRendererPlugin, RetryConfig, TaskExecutor,
};
use plancraft_core::config::expand_path;

use crate::backend::{CommandTaskExecutor, EchoTaskExecutor};
use crate::executor::{
    ExponentialBackoff, JsonlRendererPlugin, LinearBackoff, TextRendererPlugin,
};
use crate::planner::{BuiltinDecomposer, CommandDecomposer, PlanFileDecomposer};
use crate::prompt::StdinPrompt;
use crate::store::FileContextStore;

pub fn build_decomposer(cfg: &AppConfig) -> Result<Arc<dyn Decomposer>> {
    match &cfg.decomposer.provider {
        DecomposerProvider::Builtin(_) => Ok(Arc::new(BuiltinDecomposer)),
        DecomposerProvider::Command(c) => Ok(Arc::new(CommandDecomposer::new(c.clone()))),
        DecomposerProvider::PlanFile(p) => {
            let path = expand_path(&p.path)?;
            Ok(Arc::new(PlanFileDecomposer::new(path)))
        }
    }
}

pub fn build_executor(cfg: &AppConfig) -> Arc<dyn TaskExecutor> {
    match &cfg.executor.provider {
        ExecutorProvider::Echo(_) => Arc::new(EchoTaskExecutor),
        ExecutorProvider::Command(c) => Arc::new(CommandTaskExecutor::new(c.clone())),
    }
}

pub async fn build_store(cfg: &AppConfig) -> Result<Arc<dyn ContextStore>> {
    if !cfg.cache.enabled {
        return Ok(Arc::new(MemoryContextStore::new()));
    }
    let dir = match cfg.cache.directory.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => expand_path(d)?,
        _ => plancraft_core::config::get_plancraft_data_dir()?.join("cache"),
    };
    let store = FileContextStore::open(&dir)
        .await
        .with_context(|| format!("cannot open cache directory {}", dir.display()))?;
    Ok(Arc::new(store))
}

pub fn build_prompt(cfg: &AppConfig) -> Arc<dyn OperatorPrompt> {
    Arc::new(StdinPrompt::stdio(cfg.prompt.timeout_ms))
}

pub fn build_renderer(output: &OutputConfig) -> Arc<dyn OutputRendererPlugin> {
    match output.format.as_str() {
        "jsonl" => Arc::new(JsonlRendererPlugin::new(false)),
        // Anything other than jsonl behaves like text.
        _ => {
            let progress_bar = output.progress_bar && atty::is(atty::Stream::Stdout);
            Arc::new(TextRendererPlugin::new(output.ascii_only, progress_bar))
        }
    }
}

pub fn build_backoff(retry: &RetryConfig) -> Arc<dyn BackoffStrategyPlugin> {
    match retry.strategy.as_str() {
        "linear" => Arc::new(LinearBackoff::from_config(retry)),
        "exponential" | "exponential-backoff" => Arc::new(ExponentialBackoff::from_config(retry)),
        "fixed" => Arc::new(FixedBackoff::from_millis(retry.delay_ms)),
        other => {
            tracing::warn!(strategy = other, "unknown retry strategy, using fixed delay");
            Arc::new(FixedBackoff::from_millis(retry.delay_ms))
        }
    }
}
