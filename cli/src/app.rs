//! CLI assembly layer: merge command-line overrides into the config, build
//! services, and drive the orchestrator for each subcommand.
use std::fmt::Write as _;
use std::sync::Arc;

use plancraft_core::api as core_api;
use plancraft_core::api::{
    AppConfig, CliError, DecomposerProvider, ExecutorProvider, PlanError, RunOutcome,
};
use plancraft_plugins::{factory, planner};

use crate::commands::cli::{
    CacheArgs, ClassifyArgs, DriveArgs, GraphArgs, ResumeArgs, RouteArgs, RunArgs,
};

/// Fold command-line flags into a copy of the loaded config.
pub fn apply_drive_overrides(cfg: &mut AppConfig, drive: &DriveArgs) {
    if let Some(format) = drive.format {
        cfg.output.format = format.as_str().to_string();
    }
    if let Some(ms) = drive.retry_delay_ms {
        cfg.retry.delay_ms = ms;
    }
    if drive.ascii {
        cfg.output.ascii_only = true;
    }
    if drive.no_cache {
        cfg.cache.enabled = false;
    }
    if drive.dry_run {
        cfg.executor.provider = ExecutorProvider::Echo(Default::default());
    }
}

async fn build_services(
    ctx: &core_api::AppContext,
    cfg: AppConfig,
    drive: &DriveArgs,
) -> Result<core_api::Services, CliError> {
    let mut services = ctx.with_config(cfg).build_services().await?;
    if let Some(answers) = &drive.answers {
        let answers: Vec<String> = answers.split(',').map(|a| a.trim().to_string()).collect();
        tracing::debug!(count = answers.len(), "using scripted operator answers");
        services.prompt = Arc::new(core_api::ScriptedPrompt::new(answers));
    }
    Ok(services)
}

fn outcome_exit(outcome: RunOutcome) -> Result<i32, CliError> {
    match outcome {
        RunOutcome::Completed(_) => Ok(0),
        RunOutcome::Aborted { task_id, .. } => Err(CliError::Aborted { task_id }),
        RunOutcome::Blocked { waiting, .. } => Err(CliError::Blocked { waiting }),
    }
}

#[tracing::instrument(name = "cli.run_plan", skip(args, ctx), fields(requirement = %args.requirement))]
pub async fn run_plan(args: &RunArgs, ctx: &core_api::AppContext) -> Result<i32, CliError> {
    let mut cfg = ctx.cfg().clone();
    apply_drive_overrides(&mut cfg, &args.drive);
    if let Some(path) = &args.plan_file {
        cfg.decomposer.provider =
            DecomposerProvider::PlanFile(core_api::PlanFileDecomposerConfig { path: path.clone() });
    }

    let services = build_services(ctx, cfg.clone(), &args.drive).await?;
    let renderer = services.renderer.clone();
    let mut manager = core_api::TodoListManager::from_config(services, &cfg);

    let result = async {
        manager.create_plan(&args.requirement).await?;
        Ok::<_, PlanError>(manager.run().await?)
    }
    .await;
    renderer.finish();
    outcome_exit(result?)
}

#[tracing::instrument(name = "cli.resume_plan", skip(args, ctx), fields(session_id = %args.session_id))]
pub async fn resume_plan(args: &ResumeArgs, ctx: &core_api::AppContext) -> Result<i32, CliError> {
    let mut cfg = ctx.cfg().clone();
    apply_drive_overrides(&mut cfg, &args.drive);
    if !cfg.cache.enabled {
        return Err(CliError::Config(
            "cannot resume with the context cache disabled".to_string(),
        ));
    }

    let services = build_services(ctx, cfg.clone(), &args.drive).await?;
    let renderer = services.renderer.clone();
    let mut manager = core_api::TodoListManager::from_config(services, &cfg);

    let result = async {
        manager.resume(&args.session_id).await?;
        Ok::<_, PlanError>(manager.run().await?)
    }
    .await;
    renderer.finish();
    outcome_exit(result?)
}

pub fn route(args: &RouteArgs) -> String {
    let plan = core_api::TaskRouter::plan(&args.description);
    format!(
        "Decision: {:?}\nExecution: {}\nTarget: {}\nRationale: {}",
        plan.decision, plan.execution_type, plan.target, plan.rationale
    )
}

pub fn classify(args: &ClassifyArgs, cfg: &AppConfig) -> String {
    let classifier = core_api::ErrorClassifier::from_config(&cfg.retry);
    let kind = classifier.classify(&args.message);
    format!(
        "{kind} (max retries: {}, recoverable: {})",
        classifier.max_retries(kind),
        classifier.is_recoverable(&args.message)
    )
}

pub fn graph(args: &GraphArgs) -> Result<String, CliError> {
    let path = plancraft_core::config::expand_path(&args.plan_file)?;
    let text = std::fs::read_to_string(&path)?;
    let decomposition = planner::parse_plan_file(&path, &text)?;
    if decomposition.subtasks.is_empty() {
        return Err(PlanError::EmptyDecomposition.into());
    }
    let list = core_api::TaskList::from_specs(
        format!("plan file {}", path.display()),
        decomposition.subtasks,
        decomposition.rationale,
    )?;
    let resolver = core_api::DependencyResolver::new(list.tasks())?;

    let mut out = list.display(true);
    let _ = writeln!(out, "{}", resolver.stats());
    let order: Vec<String> = resolver
        .topological_order()?
        .iter()
        .map(|id| id.to_string())
        .collect();
    let _ = write!(out, "Execution order: {}", order.join(" -> "));
    Ok(out)
}

pub async fn cache(args: &CacheArgs, cfg: &AppConfig) -> Result<String, CliError> {
    let store = factory::build_store(cfg).await?;
    let cache = core_api::TaskContextCache::new(store, args.session_id.clone());
    let list = cache
        .task_list()
        .await
        .map_err(PlanError::from)?
        .ok_or_else(|| PlanError::SessionNotFound(args.session_id.clone()))?;

    let mut out = list.display(true);
    let _ = writeln!(out, "{}", cache.stats().await);
    out.push_str(&cache.build_session_summary().await);
    Ok(out)
}
